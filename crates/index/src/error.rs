use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while decoding or encoding the binary path index.
///
/// Every decode error is fatal to the call; a partially decoded index is
/// never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read would run past the end of the buffer
    #[error("Truncated index: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A value does not fit the format's 32-bit fields
    #[error("Record {record} overflows the index format: {detail}")]
    RecordOverflow { record: usize, detail: &'static str },

    /// Path bytes are not valid UTF-8
    #[error("Record {record} has a path that is not valid UTF-8")]
    InvalidUtf8 { record: usize },
}

impl CodecError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Truncated { .. } => "truncated",
            Self::RecordOverflow { .. } => "record_overflow",
            Self::InvalidUtf8 { .. } => "invalid_utf8",
        }
    }
}

/// Errors raised when slicing a preview out of a content buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("Record {path} spans {offset}+{size} beyond content length {len}")]
    OutOfBounds {
        path: String,
        offset: u32,
        size: u32,
        len: usize,
    },
}
