//! Metadata Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No metadata tool has been set up; the user needs to configure one.
    #[display("exiftool is not configured")]
    NotConfigured,
    /// The configured tool couldn't be executed.
    #[display("exiftool not found at {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The file to inspect doesn't exist.
    #[display("file does not exist: {}", _0.display())]
    SourceMissing(#[error(not(source))] PathBuf),
    /// A requested key isn't a plain tag name and would be read by the tool
    /// as an instruction.
    #[display("invalid metadata tag: {_0}")]
    InvalidTag(#[error(not(source))] String),
    /// The tool ran but its output made no sense.
    #[display("unexpected exiftool output: {_0}")]
    InvalidOutput(#[error(not(source))] String),
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
