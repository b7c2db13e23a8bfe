/// Wire primitives shared by the request and response envelopes
/// The identifier is a sum type so only one representation can ever be populated
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;

/// Protocol version carried by every envelope
pub const VERSION: &str = "2.0";

/// JSON-RPC request identifier: a string, a number, or null
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Id {
    #[default]
    Null,
    Str(String),
    Num(Number),
}

impl Id {
    /// Decode an identifier from its JSON encoding.
    ///
    /// Strings are tried first, then numbers, then the `null` literal.
    /// Any other shape (boolean, object, array) is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode the identifier as JSON
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Id::Null => b"null".to_vec(),
            Id::Str(s) => Value::String(s.clone()).to_string().into_bytes(),
            Id::Num(n) => n.to_string().into_bytes(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }

    /// Numeric value of the identifier, used when matching batch responses
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Id::Num(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => f.write_str("null"),
            Id::Str(s) => write!(f, "{:?}", s),
            Id::Num(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Num(Number::from(value))
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id::Num(Number::from(value))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Id::Null => serializer.serialize_unit(),
            Id::Str(s) => serializer.serialize_str(s),
            Id::Num(n) => n.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Id::Str(s)),
            Value::Number(n) => Ok(Id::Num(n)),
            Value::Null => Ok(Id::Null),
            other => Err(de::Error::custom(format!(
                "invalid id type: expected string, number or null, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deserialize a field that is present on the wire as `Some`, even when it is `null`.
///
/// Paired with `#[serde(default)]` so an absent key stays `None`.
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
