use thiserror::Error;

/// Errors returned by range based document operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("range {start}..{end} is out of bounds for a document of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("unknown document format: {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Problems a decoder recovered from. Decoding never aborts; these are
/// collected next to the decoded document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeIssue {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unsupported element <{0}> kept as plain text")]
    UnsupportedElement(String),
}
