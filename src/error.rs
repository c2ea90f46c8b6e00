/// Errors from the bundle loader. Every variant means the bundle failed
/// structural validation and no catalogue was produced.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("truncated bundle: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("malformed bundle: {0}")]
    Malformed(String),

    #[error("unknown meta tag {tag} in {context} descriptor")]
    UnknownMetaTag { context: &'static str, tag: u16 },

    #[error("field tags in type '{type_name}' are not strictly ascending")]
    NonMonotonicTags { type_name: String },

    #[error("protocol tags are not strictly ascending at '{name}'")]
    NonMonotonicProtocols { name: String },

    #[error("type index {index} out of range ({count} types)")]
    TypeIndexOutOfRange { index: usize, count: usize },

    #[error("invalid type code {0}")]
    InvalidTypeCode(u16),

    #[error("field '{0}' declares neither a builtin type nor a subtype")]
    MissingFieldType(String),

    #[error("invalid utf-8 in bundle name: {0}")]
    InvalidName(#[from] std::string::FromUtf8Error),
}

// The bundle loader walks the bundle with the record decoder's primitives;
// structural read failures there are schema failures.
impl From<DecodeError> for SchemaError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Truncated { need, have } => SchemaError::Truncated { need, have },
            other => SchemaError::Malformed(other.to_string()),
        }
    }
}

/// Errors from the record encoder.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("nesting deeper than {max} levels while encoding '{0}'", max = crate::codec::MAX_DEPTH)]
    TooDeep(String),

    #[error("tag gap before field '{field}' does not fit in a 16-bit header slot")]
    TagGapOverflow { field: String },

    #[error("scaled value for field '{field}' does not fit in 64 bits")]
    IntegerOverflow { field: String },

    #[error("record header for type '{0}' exceeds 65535 slots")]
    HeaderOverflow(String),
}

/// Errors from the record decoder.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated record: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("nesting deeper than {max} levels while decoding", max = crate::codec::MAX_DEPTH)]
    TooDeep,

    #[error("invalid utf-8 string in field '{field}': {source}")]
    Utf8 {
        field: String,
        source: std::string::FromUtf8Error,
    },
}

/// Errors from the pack/unpack framer.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("0xff marker at end of packed input without a count byte")]
    DanglingMarker,

    #[error("dense run needs {need} bytes but only {have} remain")]
    TruncatedRun { need: usize, have: usize },

    #[error("sparse segment overruns packed input")]
    TruncatedSegment,
}

/// Errors from the RPC host.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("unknown protocol tag {0}")]
    UnknownProtocolTag(i64),

    #[error("unknown session {0}")]
    UnknownSession(i64),

    #[error("package type '{0}' not present in schema")]
    MissingPackageType(String),

    #[error("malformed package envelope: {0}")]
    BadEnvelope(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Pack(#[from] PackError),
}

/// Top-level error type wrapping every subsystem error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Result alias for fallible sproto-wire operations.
pub type Result<T> = std::result::Result<T, Error>;
