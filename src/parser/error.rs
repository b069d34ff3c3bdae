use thiserror::Error;

pub type GFAFieldResult<T> = Result<T, ParseFieldError>;
pub type GFAResult<T> = Result<T, ParseError>;

/// How forgiving the parser is about lines it cannot handle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParserTolerance {
    /// Skip any line that fails to parse.
    IgnoreAll,
    /// Skip empty lines and unknown record types, fail on anything
    /// else.
    #[default]
    Safe,
    /// Fail on any line that cannot be handled.
    Pedantic,
}

/// Errors produced while parsing a single field.
#[derive(Debug, Clone, Error)]
pub enum ParseFieldError {
    /// A segment ID couldn't be parsed as an unsigned integer. Can
    /// only happen when parsing into a GFA<usize, T>.
    #[error("failed to parse segment ID as an unsigned integer")]
    UintIdError,
    /// A name field did not match the identifier rules, or its
    /// contents weren't UTF8.
    #[error("invalid identifier field")]
    Utf8Error,
    /// A field couldn't be parsed into the correct type
    #[error("failed to parse field into the correct type")]
    ParseFromStringError,
    /// Attempted to parse an orientation that wasn't + or -.
    #[error("orientation was not + or -")]
    OrientationError,
    /// A required field was incorrectly formatted. Includes the field
    /// name as defined by the GFA spec.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
    #[error("line ended before all required fields")]
    MissingFields,
    #[error("unparseable field")]
    Other,
}

macro_rules! impl_from_const {
    ($from:ty, $to:ty, $out:expr) => {
        impl From<$from> for $to {
            fn from(_err: $from) -> Self {
                $out
            }
        }
    };
}

macro_rules! impl_many_from {
    ($to:ty, $from:ty, $out:expr) => (
        impl_from_const!($from, $to, $out);
    );
    ($to:ty, $from:ty, $out:expr, $($f:ty, $o:expr),* $(,)?) => (
        impl_from_const!($from, $to, $out);
        impl_many_from!($to, $($f, $o),*);
    );
}

impl_many_from!(
    ParseFieldError,
    std::str::Utf8Error,
    ParseFieldError::Utf8Error,
    bstr::Utf8Error,
    ParseFieldError::Utf8Error,
    std::num::ParseIntError,
    ParseFieldError::ParseFromStringError,
    std::num::ParseFloatError,
    ParseFieldError::ParseFromStringError
);

/// Type encapsulating different kinds of GFA parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// The line type was not one handled by the parser. This is
    /// ignored by the file parser rather than a fail condition,
    /// except under pedantic tolerance.
    #[error("unknown line type")]
    UnknownLineType,
    /// Tried to parse an empty line. Can be ignored.
    #[error("empty line")]
    EmptyLine,
    /// A line couldn't be parsed. Includes the problem line and a
    /// variant describing the error.
    #[error("invalid line ({0}): {1}")]
    InvalidLine(ParseFieldError, String),
    #[error("invalid field: {0}")]
    InvalidField(ParseFieldError),
    /// A structurally parsed record failed validation against its
    /// schema or tag rules.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// A record type belonging to the other GFA version.
    #[error("record type belongs to the other GFA version: {0}")]
    WrongVersion(String),
    /// Wrapper for an IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub(crate) fn invalid_line(error: ParseFieldError, line: &[u8]) -> Self {
        let s = String::from_utf8_lossy(line);
        Self::InvalidLine(error, s.into_owned())
    }

    /// Whether a file-level parse may keep going after this error
    /// under the given tolerance.
    pub fn can_safely_continue(&self, tolerance: &ParserTolerance) -> bool {
        match tolerance {
            ParserTolerance::IgnoreAll => !matches!(self, ParseError::Io(_)),
            ParserTolerance::Safe => matches!(
                self,
                ParseError::EmptyLine | ParseError::UnknownLineType
            ),
            ParserTolerance::Pedantic => false,
        }
    }
}
