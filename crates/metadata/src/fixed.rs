use crate::MetadataProvider;
use crate::error::{ErrorKind, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stands in when no metadata tool is available. Every lookup fails with
/// [`NotConfigured`](ErrorKind::NotConfigured).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetadata;
impl MetadataProvider for NoMetadata {
    fn fetch(&self, _path: &Path, _keys: &BTreeSet<String>) -> Result<HashMap<String, String>> {
        exn::bail!(ErrorKind::NotConfigured)
    }
}

/// Serves metadata from fixed per-file maps.
///
/// Files without an entry have no metadata at all. Only the requested keys
/// are returned, as a real tool would. Counts lookups so tests can assert on
/// how often it was consulted.
///
/// ```
/// use shootsort_metadata::{MetadataProvider, StaticMetadata};
/// use std::collections::BTreeSet;
/// use std::path::Path;
///
/// let metadata = StaticMetadata::default().with("/card/a.jpg", [("Model", "X100V"), ("ISO", "200")]);
/// let keys = BTreeSet::from(["Model".to_string()]);
/// let found = metadata.fetch(Path::new("/card/a.jpg"), &keys).unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found["Model"], "X100V");
/// assert_eq!(metadata.calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StaticMetadata {
    files: HashMap<PathBuf, HashMap<String, String>>,
    calls: AtomicUsize,
}
impl StaticMetadata {
    pub fn with<K: Into<String>, V: Into<String>>(
        mut self,
        path: impl Into<PathBuf>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let values = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.files.insert(path.into(), values);
        self
    }

    /// Number of lookups made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}
impl MetadataProvider for StaticMetadata {
    fn fetch(&self, path: &Path, keys: &BTreeSet<String>) -> Result<HashMap<String, String>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let Some(values) = self.files.get(path) else {
            return Ok(HashMap::new());
        };
        Ok(values
            .iter()
            .filter(|(key, _)| keys.contains(*key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_metadata() {
        let err = NoMetadata.fetch(Path::new("a.jpg"), &BTreeSet::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotConfigured));
    }

    #[test]
    fn test_static_metadata_filters_keys() {
        let metadata = StaticMetadata::default().with("a.jpg", [("Model", "X100V"), ("model", "lowercase")]);
        let keys = BTreeSet::from(["Model".to_string(), "Missing".to_string()]);
        let found = metadata.fetch(Path::new("a.jpg"), &keys).unwrap();
        assert_eq!(found, HashMap::from([("Model".to_string(), "X100V".to_string())]));
        assert!(metadata.fetch(Path::new("b.jpg"), &keys).unwrap().is_empty());
        assert_eq!(metadata.calls(), 2);
    }
}
