//! The Model Context Protocol (MCP) surface: the expense tools and the
//! category catalog resource, served over streamable HTTP or over a byte
//! stream such as stdin/stdout.

mod handler;

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rmcp::{
    ServiceExt,
    transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    },
};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{AppState, Error, logging::REQUEST_BODY_LIMIT};

pub use handler::{ExpenseServer, SERVER_NAME};

/// The JSON-RPC error code for a message that is not a valid request object.
const INVALID_REQUEST: i64 = -32600;

/// Build the streamable HTTP service that answers MCP messages.
///
/// The service is stateless: every POST is handled by a fresh
/// [ExpenseServer] and no session ID is issued, so clients do not need to
/// send `initialize` before calling tools.
pub fn streamable_http_service(
    state: AppState,
) -> StreamableHttpService<ExpenseServer, LocalSessionManager> {
    let mut config = StreamableHttpServerConfig::default();
    config.stateful_mode = false;

    StreamableHttpService::new(
        move || Ok(ExpenseServer::new(state.clone())),
        Arc::new(LocalSessionManager::default()),
        config,
    )
}

/// Serve a single MCP session over a pair of byte streams, e.g. stdin and
/// stdout, until the client disconnects.
///
/// Messages are newline-delimited JSON. The client must start the session
/// with `initialize`.
///
/// # Errors
/// Returns [Error::TransportError] if the `initialize` handshake fails or the
/// session task panics.
pub async fn serve_io<R, W>(state: AppState, reader: R, writer: W) -> Result<(), Error>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let session = ExpenseServer::new(state)
        .serve((reader, writer))
        .await
        .map_err(|error| Error::TransportError(error.to_string()))?;

    let reason = session
        .waiting()
        .await
        .map_err(|error| Error::TransportError(error.to_string()))?;
    tracing::info!("MCP session ended: {reason:?}");

    Ok(())
}

/// Reject JSON-RPC messages whose `id` is `null`.
///
/// A request must carry a string or number ID, and a notification has no
/// `id` member at all. A null ID is neither, so the client gets an explicit
/// error instead of having the message treated as a notification and
/// silently dropped.
pub async fn reject_null_request_ids(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, REQUEST_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("rejected request body for {} {}: {error}", parts.method, parts.uri);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    if has_null_id(&body_bytes) {
        tracing::warn!("rejected JSON-RPC message with a null id");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {
                    "code": INVALID_REQUEST,
                    "message": "Invalid Request: id must be a string or a number",
                },
            })),
        )
            .into_response();
    }

    next.run(Request::from_parts(parts, Body::from(body_bytes)))
        .await
}

fn has_null_id(body: &[u8]) -> bool {
    let is_null_id = |message: &Value| matches!(message.get("id"), Some(Value::Null));

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(batch)) => batch.iter().any(is_null_id),
        Ok(message) => is_null_id(&message),
        Err(_) => false,
    }
}



#[cfg(test)]
mod io_transport_tests {
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::io::{
        AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
        duplex, split,
    };

    use crate::{rpc::serve_io, test_utils::get_test_state};

    async fn send(writer: &mut WriteHalf<DuplexStream>, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .expect("Could not write message");
    }

    /// Read messages until the response to request `id` arrives.
    async fn response_to(lines: &mut Lines<BufReader<ReadHalf<DuplexStream>>>, id: i64) -> Value {
        loop {
            let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
                .await
                .expect("Timed out waiting for a response")
                .expect("Could not read line")
                .expect("Stream closed before a response arrived");
            let message: Value = serde_json::from_str(&line).expect("Response is not JSON");

            if message["id"] == json!(id) {
                return message;
            }
        }
    }

    #[tokio::test]
    async fn serves_tools_over_a_byte_stream() {
        let (_dir, state) = get_test_state();
        let (client, server) = duplex(64 * 1024);
        let (server_read, server_write) = split(server);
        let session = tokio::spawn(serve_io(state, server_read, server_write));

        let (client_read, mut client_write) = split(client);
        let mut lines = BufReader::new(client_read).lines();

        send(
            &mut client_write,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "expense-test", "version": "0.0.0"},
                },
            }),
        )
        .await;
        let initialized = response_to(&mut lines, 1).await;
        send(
            &mut client_write,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;

        send(
            &mut client_write,
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {
                    "name": "add_expense",
                    "arguments": {"date": "2024-01-05", "amount": 12.5, "category": "Food"},
                },
            }),
        )
        .await;
        let added = response_to(&mut lines, 2).await;

        send(
            &mut client_write,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "summarize",
                    "arguments": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
                },
            }),
        )
        .await;
        let summary = response_to(&mut lines, 3).await;

        assert_eq!(
            initialized["result"]["serverInfo"]["name"],
            json!("Expense Tracker")
        );
        assert_eq!(
            added["result"]["structuredContent"],
            json!({"status": "OK", "id": 1})
        );
        assert_eq!(
            summary["result"]["structuredContent"]["result"],
            json!([{"category": "Food", "total_amount": 12.5}])
        );

        drop(client_write);
        drop(lines);
        let outcome = tokio::time::timeout(Duration::from_secs(5), session)
            .await
            .expect("Session did not end after the client disconnected")
            .expect("Session task panicked");
        assert_eq!(outcome, Ok(()));
    }
}
