//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the stage of an import that failed.
///
/// Each variant identifies the subsystem that failed; the underlying
/// [`exn`] error tree carries the details.
///
/// ### Before any I/O
/// - [`ErrorKind::Template`]
///
/// ### Before any write
/// - [`ErrorKind::Enumerate`]
/// - [`ErrorKind::Metadata`]
/// - [`ErrorKind::MetadataNotConfigured`]
///
/// ### After writes may have happened
/// - [`ErrorKind::Transfer`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The destination template failed to compile.
    #[display("invalid destination template")]
    Template,
    /// The MIME filter failed to compile.
    #[display("invalid file filter")]
    Filter,
    /// Listing the source files failed.
    #[display("could not enumerate source files")]
    Enumerate,
    /// Fetching metadata for one of the files failed; the whole batch is abandoned.
    #[display("could not read file metadata")]
    Metadata,
    /// The template needs metadata but no metadata tool is set up.
    #[display("metadata tool is not configured")]
    MetadataNotConfigured,
    /// Creating a directory or transferring a file failed. Files placed
    /// before the failure stay where they are.
    #[display("could not place file")]
    Transfer,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Enumerate | Self::Metadata | Self::Transfer)
    }
}
