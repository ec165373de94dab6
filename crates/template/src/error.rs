//! Template Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A template compilation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Each variant carries the raw marker body (or the offending part of it) so
/// the caller can point the user at the exact text to fix.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// `#file:…#` named a property that doesn't exist.
    #[display("invalid file property: {_0}")]
    InvalidFileProperty(#[error(not(source))] String),
    /// `#sequence:…#` scope was neither `global` nor `local`.
    #[display("invalid sequence type: {_0}")]
    InvalidSequenceType(#[error(not(source))] String),
    /// `#sequence:…:N#` padding width was not a non-negative integer no
    /// larger than [`MAX_SEQUENCE_WIDTH`](crate::MAX_SEQUENCE_WIDTH).
    #[display("invalid sequence format: {_0}")]
    InvalidSequenceFormat(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidFileProperty("size".into()).to_string(), "invalid file property: size");
        assert_eq!(ErrorKind::InvalidSequenceType("total".into()).to_string(), "invalid sequence type: total");
        assert_eq!(ErrorKind::InvalidSequenceFormat("err".into()).to_string(), "invalid sequence format: err");
    }
}
