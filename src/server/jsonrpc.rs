/// JSON-RPC 2.0 protocol implementation
/// Envelope types and the error taxonomy, independent of any transport
use crate::types::{deserialize_present, Id, VERSION};
use crate::validation::{ValidationError, Validator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// JSON-RPC 2.0 request structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// `None` only when the `id` key is missing on the wire; an explicit
    /// `null` decodes to `Some(Id::Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Id>,
}

impl JsonRpcRequest {
    /// Create a request that expects a response
    pub fn new(method: impl Into<String>, params: Option<Value>, id: impl Into<Id>) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    /// Create a notification (no id, no response)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Decode and validate a request from raw JSON bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, ValidationError> {
        let request: JsonRpcRequest = serde_json::from_slice(bytes)?;
        Validator::validate_request(&request)?;
        Ok(request)
    }

    /// Decode and validate a request from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let request: JsonRpcRequest = serde_json::from_value(value)?;
        Validator::validate_request(&request)?;
        Ok(request)
    }

    /// True iff the `id` key was absent on the wire
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Decode `params` into a typed value.
    ///
    /// Missing params decode as JSON `null`, so `Option<T>` and `()` accept
    /// them. Failures map to Invalid params with the decode message as data.
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, JsonRpcError> {
        T::deserialize(self.params.as_ref().unwrap_or(&Value::Null))
            .map_err(|e| JsonRpcError::invalid_params().with_data(e.to_string()))
    }
}

/// JSON-RPC 2.0 response structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Id,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Id, result: Value) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Id, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Standard JSON-RPC 2.0 error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Custom(i64),
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::Custom(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::Custom(_) => "Server error",
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            other => ErrorCode::Custom(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC 2.0 error structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("jsonrpc2 error: code={code}, message={message:?}")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a custom error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error carrying the canonical message for `code`
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code.code(), code.message())
    }

    /// Create a parse error (-32700)
    pub fn parse_error() -> Self {
        Self::from_code(ErrorCode::ParseError)
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request() -> Self {
        Self::from_code(ErrorCode::InvalidRequest)
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found() -> Self {
        Self::from_code(ErrorCode::MethodNotFound)
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params() -> Self {
        Self::from_code(ErrorCode::InvalidParams)
    }

    /// Create an internal error (-32603)
    pub fn internal_error() -> Self {
        Self::from_code(ErrorCode::InternalError)
    }

    /// Attach diagnostic data.
    ///
    /// If `data` cannot be serialized the error is returned unchanged; the
    /// primary error must still reach the client.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => debug!(error = %e, code = self.code, "Dropping unserializable error data"),
        }
        self
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }
}
