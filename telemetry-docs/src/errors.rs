use rag_store::ErrorKind;
use thiserror::Error;

/// Why a telemetry row could not become a document. Every variant is a malformed record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocError {
    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("record identifier is missing or empty")]
    EmptyId,

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field `{field}` is not finite")]
    NonFinite { field: &'static str },
}

impl DocError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedRecord
    }
}
