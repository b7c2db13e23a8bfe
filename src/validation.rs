/// Envelope validation for inbound JSON-RPC requests
/// Failures here surface to clients as Invalid Request (-32600)
use crate::server::jsonrpc::JsonRpcRequest;
use crate::types::VERSION;

/// Validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field format: {field} - {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Invalid JSON structure: {reason}")]
    InvalidJson { reason: String },
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::InvalidJson {
            reason: err.to_string(),
        }
    }
}

/// Request validation utilities
pub struct Validator;

impl Validator {
    /// Check a decoded request against the protocol rules
    pub fn validate_request(request: &JsonRpcRequest) -> Result<(), ValidationError> {
        if request.jsonrpc != VERSION {
            return Err(ValidationError::InvalidFormat {
                field: "jsonrpc".to_string(),
                reason: format!("got {:?}, want {:?}", request.jsonrpc, VERSION),
            });
        }

        if request.method.is_empty() {
            return Err(ValidationError::MissingField {
                field: "method".to_string(),
            });
        }

        Ok(())
    }
}
