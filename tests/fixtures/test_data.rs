/// Test fixtures and sample payloads for integration tests

/// Sample JSON-RPC requests for testing
pub mod json_rpc {
    use serde_json::{json, Value};

    pub fn ping_request(id: u64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "ping",
            "id": id
        })
    }

    pub fn add_request(id: u64, a: i64, b: i64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "add",
            "params": {"a": a, "b": b},
            "id": id
        })
    }

    pub fn add_notification(a: i64, b: i64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "add",
            "params": {"a": a, "b": b}
        })
    }

    /// Three calls, one unknown method, one notification
    pub fn mixed_batch() -> Value {
        json!([
            {"jsonrpc": "2.0", "method": "add", "params": {"a": 1, "b": 2}, "id": 1},
            {"jsonrpc": "2.0", "method": "nope", "id": 2},
            {"jsonrpc": "2.0", "method": "add", "params": {"a": 5, "b": 7}, "id": 3},
            {"jsonrpc": "2.0", "method": "add", "params": {"a": 99, "b": 1}}
        ])
    }
}
