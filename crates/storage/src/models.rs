//! Storage models.
//!
//! These types describe files discovered by a [`Filesystem`](crate::Filesystem)
//! and the way they are transferred into the destination tree.

use derive_more::Display;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use time::{OffsetDateTime, UtcOffset};

/// A candidate file found under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the source root; the file's identity for rendering and ordering.
    pub path: PathBuf,
    /// Location used for the actual transfer.
    pub absolute: PathBuf,
    pub created: Option<OffsetDateTime>,
    pub modified: Option<OffsetDateTime>,
}
impl SourceFile {
    pub fn new(root: impl AsRef<Path>, relative: impl Into<PathBuf>) -> Self {
        let path = relative.into();
        Self {
            absolute: root.as_ref().join(&path),
            path,
            created: None,
            modified: None,
        }
    }

    pub fn with_dates(mut self, created: Option<OffsetDateTime>, modified: Option<OffsetDateTime>) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    /// Canonical string form of the file identity, used as the batch sort key.
    pub fn identity(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }
}

/// Converts a filesystem timestamp into a date-time in the local offset, or
/// UTC when the local offset can't be determined (e.g. multi-threaded Unix).
pub fn local_timestamp(timestamp: SystemTime) -> OffsetDateTime {
    let utc = OffsetDateTime::from(timestamp);
    match UtcOffset::local_offset_at(utc) {
        Ok(offset) => utc.to_offset(offset),
        Err(_) => utc,
    }
}

/// How a file reaches its destination.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransferMode {
    /// Leave the source untouched.
    #[default]
    #[display("copy")]
    Copy,
    /// Remove the source once the destination exists.
    #[display("move")]
    Move,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_paths() {
        let file = SourceFile::new("/photos/card", "day1/IMG_0001.JPG");
        assert_eq!(file.path, Path::new("day1/IMG_0001.JPG"));
        assert_eq!(file.absolute, Path::new("/photos/card/day1/IMG_0001.JPG"));
        assert_eq!(file.identity(), "day1/IMG_0001.JPG");
    }

    #[test]
    fn test_transfer_mode_display() {
        assert_eq!(TransferMode::default(), TransferMode::Copy);
        assert_eq!(TransferMode::Copy.to_string(), "copy");
        assert_eq!(TransferMode::Move.to_string(), "move");
    }
}
