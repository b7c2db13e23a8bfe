/// Request dispatcher
/// Maps a raw payload to zero or more responses; transport agnostic
use crate::server::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::registry::{Handler, Registry};
use crate::types::Id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Written when a reply cannot be encoded
const ENCODE_FAILURE_BODY: &[u8] =
    br#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#;

/// Responses produced for one payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Batch(Vec<JsonRpcResponse>),
    Single(JsonRpcResponse),
}

/// Stateless dispatcher over a shared registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handle a raw payload and return the encoded reply.
    ///
    /// `None` means there is nothing to send: a notification, or a batch made
    /// up only of notifications.
    pub fn handle_payload(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let reply = self.dispatch(payload)?;
        Some(encode_reply(&reply))
    }

    /// Handle a raw payload and return the typed reply
    pub fn dispatch(&self, payload: &[u8]) -> Option<Reply> {
        let value: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Payload is not valid JSON");
                return Some(Reply::Single(JsonRpcResponse::error(
                    Id::Null,
                    JsonRpcError::parse_error().with_data(e.to_string()),
                )));
            }
        };

        match value {
            Value::Array(items) => self.dispatch_batch(items),
            single => self.dispatch_value(single).map(Reply::Single),
        }
    }

    fn dispatch_batch(&self, items: Vec<Value>) -> Option<Reply> {
        if items.is_empty() {
            debug!("Rejected empty batch");
            return Some(Reply::Single(JsonRpcResponse::error(
                Id::Null,
                JsonRpcError::invalid_request().with_data("empty batch"),
            )));
        }

        let size = items.len();
        // Sequential so the response order follows the input order.
        let responses: Vec<JsonRpcResponse> = items
            .into_iter()
            .filter_map(|item| self.dispatch_value(item))
            .collect();
        debug!(size, responses = responses.len(), "Dispatched batch");

        if responses.is_empty() {
            None
        } else {
            Some(Reply::Batch(responses))
        }
    }

    fn dispatch_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.invoke(&request),
            Err(e) => {
                debug!(error = %e, "Rejected invalid request");
                // The id cannot be trusted once validation failed.
                Some(JsonRpcResponse::error(
                    Id::Null,
                    JsonRpcError::invalid_request().with_data(e.to_string()),
                ))
            }
        }
    }

    /// Run a validated request through its handler.
    ///
    /// Returns `None` for notifications, whatever the outcome.
    pub fn invoke(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let outcome = match self.registry.get(&request.method) {
            Some(handler) => call_handler(handler.as_ref(), request),
            None => {
                debug!(method = %request.method, "Method not found");
                Err(JsonRpcError::method_not_found())
            }
        };

        let Some(id) = request.id.clone() else {
            if let Err(e) = &outcome {
                warn!(
                    method = %request.method,
                    code = e.code,
                    message = %e.message,
                    "Notification failed"
                );
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, e),
        })
    }
}

fn call_handler(handler: &dyn Handler, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))) {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(method = %request.method, "Handler panicked");
            Err(JsonRpcError::internal_error().with_data("handler panicked"))
        }
    }
}

fn encode_reply(reply: &Reply) -> Vec<u8> {
    match serde_json::to_vec(reply) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to serialize JSON-RPC reply");
            ENCODE_FAILURE_BODY.to_vec()
        }
    }
}
