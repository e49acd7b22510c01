//! Application router configuration.

use axum::{Router, middleware};

use crate::{
    AppState, endpoints,
    not_found::get_404_not_found,
    rpc::{reject_null_request_ids, streamable_http_service},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route_service(endpoints::RPC, streamable_http_service(state))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(reject_null_request_ids))
}
