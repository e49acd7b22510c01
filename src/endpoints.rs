//! The API endpoints URIs.

/// The route that serves MCP over streamable HTTP.
pub const RPC: &str = "/mcp";
