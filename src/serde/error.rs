//! Error type for the serde bridge.

use std::fmt::Display;

use crate::error::{DecodeError, EncodeError};

#[derive(Debug)]
pub enum SerdeError {
    /// Expected and actual value shapes disagree.
    TypeMismatch { expected: String, actual: String },
    /// A required field is missing during deserialization.
    MissingField(String),
    /// The Rust type has no representation in the wire format.
    UnsupportedType(String),
    /// Internal sentinel: a `None` was serialized. The struct serializer
    /// turns this into an omitted field; it never escapes the bridge.
    Absent,
    /// Error from the record encoder.
    Encode(EncodeError),
    /// Error from the record decoder.
    Decode(DecodeError),
    Custom(String),
}

impl Display for SerdeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerdeError::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {}, got {}", expected, actual)
            }
            SerdeError::MissingField(name) => write!(f, "missing required field '{}'", name),
            SerdeError::UnsupportedType(ty) => write!(f, "unsupported type: {}", ty),
            SerdeError::Absent => write!(f, "absent value outside a struct field"),
            SerdeError::Encode(e) => write!(f, "encode error: {}", e),
            SerdeError::Decode(e) => write!(f, "decode error: {}", e),
            SerdeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SerdeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerdeError::Encode(e) => Some(e),
            SerdeError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EncodeError> for SerdeError {
    fn from(e: EncodeError) -> Self {
        SerdeError::Encode(e)
    }
}

impl From<DecodeError> for SerdeError {
    fn from(e: DecodeError) -> Self {
        SerdeError::Decode(e)
    }
}

impl serde::ser::Error for SerdeError {
    fn custom<T: Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}
