//! Decode and load errors

use thiserror::Error;

/// A snapshot payload could not be decoded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("{expected} expected, found '{found}' instead")]
    BadMarker { expected: &'static str, found: char },

    #[error("unknown filter type '{0}'")]
    UnknownFilter(String),

    #[error("unknown value type '{0}'")]
    UnknownValueType(char),

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("malformed 7-bit encoded length")]
    BadLength,

    #[error("negative count {0}")]
    NegativeCount(i32),
}

/// Reasons a snapshot file is discarded on load
#[derive(Debug, Error)]
pub enum InvalidStore {
    #[error("invalid header")]
    Header,

    #[error("unsupported format version {0}")]
    Unsupported(i64),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}
