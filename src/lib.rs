//! Expense Tracker is a small service for logging personal expenses.
//!
//! Expenses are stored in a single SQLite table and can be listed by date
//! range or totalled per category. The operations are exposed as Model
//! Context Protocol (MCP) tools, alongside a read-only category catalog
//! resource, over streamable HTTP or stdin/stdout.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod category;
mod db;
mod endpoints;
mod error;
mod expense;
mod logging;
mod not_found;
mod routing;
mod rpc;
#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{CATEGORIES_MIME_TYPE, CATEGORIES_URI, read_category_catalog};
pub use db::{initialize as initialize_db, open_connection};
pub use error::Error;
pub use expense::{
    CategoryTotal, DateRange, Expense, ExpenseId, NewExpense, create_expense,
    get_expenses_in_range, summarize_expenses,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware};
pub use routing::build_router;
pub use rpc::{ExpenseServer, SERVER_NAME, serve_io};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
