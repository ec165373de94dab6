//! Content-type filtering of enumerated files.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use std::path::Path;

/// MIME type assumed for extensions nobody has heard of.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// A set of alternative regular expressions matched against the MIME type
/// inferred from a file's extension.
///
/// A file passes if *any* expression matches (anywhere in the type string).
/// An empty filter lets everything through.
///
/// ```
/// use shootsort_storage::MimeFilter;
///
/// let filter = MimeFilter::new(["image/.+"]).unwrap();
/// assert!(filter.matches("IMG_0001.JPG"));
/// assert!(!filter.matches("notes.txt"));
/// assert!(MimeFilter::any().matches("notes.txt"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct MimeFilter {
    patterns: Vec<Regex>,
}
impl MimeFilter {
    pub fn new(patterns: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()).or_raise(|| ErrorKind::InvalidFilter(p.as_ref().to_string())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// A filter that accepts every file.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let guess = mime_guess::from_path(path.as_ref()).first_raw().unwrap_or(UNKNOWN_MIME_TYPE);
        self.patterns.iter().any(|p| p.is_match(guess))
    }
}
