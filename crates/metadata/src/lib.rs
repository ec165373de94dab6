//! Reading embedded metadata (EXIF, IPTC, XMP, maker notes) from image files.
//!
//! The importer only ever needs a handful of named values per file, so the
//! interface is a single blocking lookup: file and tag names in, tag values
//! as strings out. Callers are expected to run it on a blocking thread.

pub mod error;
mod exiftool;
mod fixed;

pub use crate::exiftool::{EXIFTOOL_BINARY, ExifTool};
pub use crate::fixed::{NoMetadata, StaticMetadata};
use crate::error::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Source of per-file metadata values.
///
/// Tag names are case-sensitive. A tag the file doesn't carry is simply
/// absent from the returned map; it is not an error.
pub trait MetadataProvider: Send + Sync {
    fn fetch(&self, path: &Path, keys: &BTreeSet<String>) -> Result<HashMap<String, String>>;
}

pub type MetadataHandle = Arc<dyn MetadataProvider + Send + Sync>;
