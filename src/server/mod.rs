/// JSON-RPC 2.0 handling and HTTP transport
/// Protocol, registry and dispatch are transport agnostic; `http` binds them to axum
pub mod dispatcher;
pub mod http;
pub mod jsonrpc;
pub mod registry;

// Re-export for convenience
pub use http::HttpServer;
