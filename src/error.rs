use thiserror::Error;

use crate::parser::error::{ParseError, ParseFieldError};

/// Result type alias for graph and field operations.
pub type GfaResult<T> = std::result::Result<T, GfaError>;

/// The closed set of error kinds surfaced by the crate. Parsing
/// produces the finer-grained [`ParseError`]/[`ParseFieldError`]
/// variants, which convert into `Format` here.
#[derive(Debug, Error)]
pub enum GfaError {
    /// A field or line is syntactically invalid.
    #[error("format error: {0}")]
    Format(String),

    /// A value does not have the datatype required in its position,
    /// e.g. a predefined tag carrying the wrong type character.
    #[error("type error: {0}")]
    Type(String),

    /// A required record, tag, or field is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// An identifier collides with one already present in the graph.
    #[error("duplicated identifier: {0}")]
    NotUnique(String),

    /// A record or the graph violates a structural invariant, e.g. a
    /// duplicated tag or an overlap list of the wrong length.
    #[error("inconsistent record: {0}")]
    Inconsistency(String),

    /// A field or record type is only valid in the other GFA version.
    #[error("version mismatch: {0}")]
    Version(String),

    /// A user-supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// An operation hit an unsupported case, e.g. merging across a
    /// non-M overlap or mutating a virtual record.
    #[error("unsupported operation: {0}")]
    Runtime(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParseError> for GfaError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Io(e) => GfaError::Io(e),
            ParseError::WrongVersion(line) => GfaError::Version(line),
            other => GfaError::Format(other.to_string()),
        }
    }
}

impl From<ParseFieldError> for GfaError {
    fn from(err: ParseFieldError) -> Self {
        GfaError::Format(err.to_string())
    }
}

impl From<std::str::Utf8Error> for GfaError {
    fn from(err: std::str::Utf8Error) -> Self {
        GfaError::Format(err.to_string())
    }
}
