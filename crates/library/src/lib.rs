//! Batch import of a folder of photos into a templated destination tree.
//!
//! An import runs in three stages:
//! 1. **enumerate** the candidate files under the source root,
//! 2. [`plan`] a destination for each one by rendering the template, and
//! 3. [`place`] every file, never overwriting anything already there.
//!
//! [`import`] strings the three together.

pub mod error;
mod import;
mod place;
mod plan;

pub use crate::import::{Context, Summary, import};
pub use crate::place::{place, with_suffix};
pub use crate::plan::plan;
use std::path::PathBuf;

/// Upper bound on metadata lookups running at the same time. Each lookup
/// occupies a blocking thread and, for exiftool, a child process.
pub const MAX_METADATA_CONCURRENCY: usize = 16;

/// Where one source file is meant to go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportPair {
    /// Absolute path of the file to import.
    pub source: PathBuf,
    /// Absolute destination before collision resolution.
    pub destination: PathBuf,
}
impl ImportPair {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}
