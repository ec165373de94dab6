//! In-memory filesystem for testing.

use super::{SourceFileStream, is_hidden};
use crate::error::{ErrorKind, Result};
use crate::{Filesystem, MimeFilter, SourceFile};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// A mutating call made against a [`MockFilesystem`], successful or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    CreateDir(PathBuf),
    Copy(PathBuf, PathBuf),
    Rename(PathBuf, PathBuf),
}

#[derive(Clone, Debug)]
struct MockFile {
    data: Vec<u8>,
    created: Option<OffsetDateTime>,
    modified: Option<OffsetDateTime>,
}

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, MockFile>,
    dirs: BTreeSet<PathBuf>,
    denied: HashSet<PathBuf>,
    calls: Vec<MockCall>,
}
impl State {
    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn check_writable(&self, to: &Path) -> Result<()> {
        if self.denied.contains(to) {
            exn::bail!(ErrorKind::PermissionDenied(to.to_path_buf()));
        }
        if self.files.contains_key(to) || self.dirs.contains(to) {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty())
            && !self.dirs.contains(parent)
        {
            exn::bail!(ErrorKind::NotFound(parent.to_path_buf()));
        }
        Ok(())
    }
}

/// In-memory filesystem for testing.
///
/// Files and directories live in maps behind a [`RwLock`], so all trait
/// methods can operate on `&self`. Directories must be created before files
/// can be placed in them, and every mutating call is recorded so tests can
/// assert on exactly what was attempted.
///
/// # Examples
///
/// ```
/// use shootsort_storage::backend::MockFilesystem;
/// use shootsort_storage::Filesystem;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = MockFilesystem::with_files([("/card/IMG_0001.JPG", b"jpeg")]);
/// fs.create_dir(Path::new("/photos")).await?;
/// fs.copy(Path::new("/card/IMG_0001.JPG"), Path::new("/photos/IMG_0001.JPG")).await?;
/// assert!(fs.exists(Path::new("/photos/IMG_0001.JPG")).await);
/// # Ok(())
/// # }
/// ```
pub struct MockFilesystem {
    name: String,
    state: RwLock<State>,
}

impl MockFilesystem {
    /// Create a mock filesystem pre-populated with files. Their parent
    /// directories are created implicitly.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut state = State::default();
        for (path, data) in files {
            let path = path.into();
            if let Some(parent) = path.parent() {
                state.add_dir_all(parent);
            }
            let file = MockFile {
                data: data.into(),
                created: None,
                modified: None,
            };
            state.files.insert(path, file);
        }
        Self {
            name: "mock".to_string(),
            state: RwLock::new(state),
        }
    }

    /// Change the name of the mock filesystem.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the timestamps reported for an existing file.
    ///
    /// Panics if the file doesn't exist. If test setup is wrong, then test
    /// should not pass.
    pub fn with_dates(
        mut self,
        path: impl AsRef<Path>,
        created: Option<OffsetDateTime>,
        modified: Option<OffsetDateTime>,
    ) -> Self {
        let path = path.as_ref();
        let Some(file) = self.state.get_mut().files.get_mut(path) else {
            panic!("MockFilesystem::with_dates: no such file {}", path.display());
        };
        file.created = created;
        file.modified = modified;
        self
    }

    /// Make every write to `path` fail with
    /// [`PermissionDenied`](ErrorKind::PermissionDenied).
    pub fn with_denied(mut self, path: impl Into<PathBuf>) -> Self {
        self.state.get_mut().denied.insert(path.into());
        self
    }

    pub async fn exists(&self, path: &Path) -> bool {
        let state = self.state.read().await;
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    pub async fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.read().await.files.get(path).map(|f| f.data.clone())
    }

    /// All file paths currently present, sorted.
    pub async fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.state.read().await.files.keys().cloned().collect();
        files.sort();
        files
    }

    /// Every mutating call made so far, in order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.read().await.calls.clone()
    }
}
impl Default for MockFilesystem {
    fn default() -> Self {
        let files: [(&str, &[u8]); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl Filesystem for MockFilesystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_stream<'a>(&'a self, root: &'a Path, filter: &'a MimeFilter, recursive: bool) -> SourceFileStream<'a> {
        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let found = {
                let state = self.state.read().await;
                if !state.dirs.contains(root) {
                    Err(exn::Exn::from(ErrorKind::NotFound(root.to_path_buf())))
                } else {
                    Ok(state
                        .files
                        .iter()
                        .filter_map(|(path, file)| {
                            let relative = path.strip_prefix(root).ok()?;
                            let depth = relative.components().count();
                            let visible = relative.components().all(|c| !is_hidden(c.as_os_str()));
                            (visible && (recursive || depth == 1) && filter.matches(path)).then(|| {
                                SourceFile::new(root, relative).with_dates(file.created, file.modified)
                            })
                        })
                        .collect::<Vec<_>>())
                }
            };
            match found {
                Ok(files) => for file in files { yield Ok(file) },
                Err(e) => yield Err(e),
            }
        })
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let mut state = self.state.write().await;
        state.calls.push(MockCall::CreateDir(path.to_path_buf()));
        if state.denied.contains(path) {
            exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()));
        }
        if state.files.contains_key(path) {
            exn::bail!(ErrorKind::AlreadyExists(path.to_path_buf()));
        }
        state.add_dir_all(path);
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.write().await;
        state.calls.push(MockCall::Copy(from.to_path_buf(), to.to_path_buf()));
        let Some(file) = state.files.get(from).cloned() else {
            exn::bail!(ErrorKind::NotFound(from.to_path_buf()));
        };
        state.check_writable(to)?;
        state.files.insert(to.to_path_buf(), file);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.write().await;
        state.calls.push(MockCall::Rename(from.to_path_buf(), to.to_path_buf()));
        if !state.files.contains_key(from) {
            exn::bail!(ErrorKind::NotFound(from.to_path_buf()));
        }
        state.check_writable(to)?;
        if let Some(file) = state.files.remove(from) {
            state.files.insert(to.to_path_buf(), file);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn card() -> MockFilesystem {
        MockFilesystem::with_files([
            ("/card/IMG_0001.JPG", Vec::from(*b"one")),
            ("/card/day1/IMG_0002.JPG", Vec::from(*b"two")),
            ("/card/.hidden/IMG_0003.JPG", Vec::from(*b"three")),
            ("/card/notes.txt", Vec::from(*b"text")),
            ("/elsewhere/IMG_0004.JPG", Vec::from(*b"four")),
        ])
    }

    #[tokio::test]
    async fn test_find_files() {
        let fs = card();
        let mut files = fs.find_files(Path::new("/card"), &MimeFilter::any(), true).await.unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("IMG_0001.JPG"), PathBuf::from("day1/IMG_0002.JPG"), PathBuf::from("notes.txt")]
        );
        assert_eq!(files[1].absolute, Path::new("/card/day1/IMG_0002.JPG"));
    }

    #[tokio::test]
    async fn test_find_files_not_recursive_and_filtered() {
        let fs = card();
        let filter = MimeFilter::new(["image/.+"]).unwrap();
        let files = fs.find_files(Path::new("/card"), &filter, false).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("IMG_0001.JPG"));
    }

    #[tokio::test]
    async fn test_find_files_missing_root() {
        let err = card().find_files(Path::new("/nope"), &MimeFilter::any(), true).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_files_dates() {
        let created = datetime!(2024-01-02 03:04:05 UTC);
        let fs = card().with_dates("/card/IMG_0001.JPG", Some(created), None);
        let files = fs.find_files(Path::new("/card"), &MimeFilter::any(), false).await.unwrap();
        let file = files.iter().find(|f| f.path == Path::new("IMG_0001.JPG")).unwrap();
        assert_eq!(file.created, Some(created));
        assert_eq!(file.modified, None);
    }

    #[tokio::test]
    async fn test_copy_requires_parent() {
        let fs = card();
        let err = fs.copy(Path::new("/card/IMG_0001.JPG"), Path::new("/out/IMG_0001.JPG")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if p == Path::new("/out")));
        fs.create_dir(Path::new("/out")).await.unwrap();
        fs.copy(Path::new("/card/IMG_0001.JPG"), Path::new("/out/IMG_0001.JPG")).await.unwrap();
        assert_eq!(fs.read(Path::new("/out/IMG_0001.JPG")).await.unwrap(), b"one");
        assert!(fs.exists(Path::new("/card/IMG_0001.JPG")).await);
    }

    #[tokio::test]
    async fn test_copy_never_overwrites() {
        let fs = card();
        let err = fs.copy(Path::new("/card/IMG_0001.JPG"), Path::new("/card/notes.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(fs.read(Path::new("/card/notes.txt")).await.unwrap(), b"text");
    }

    #[tokio::test]
    async fn test_rename() {
        let fs = card();
        fs.rename(Path::new("/card/IMG_0001.JPG"), Path::new("/elsewhere/moved.JPG")).await.unwrap();
        assert!(!fs.exists(Path::new("/card/IMG_0001.JPG")).await);
        assert_eq!(fs.read(Path::new("/elsewhere/moved.JPG")).await.unwrap(), b"one");
        let err = fs.rename(Path::new("/card/IMG_0001.JPG"), Path::new("/elsewhere/x.JPG")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_denied_and_call_log() {
        let fs = card().with_denied("/elsewhere/IMG_0001.JPG");
        let err = fs.copy(Path::new("/card/IMG_0001.JPG"), Path::new("/elsewhere/IMG_0001.JPG")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
        fs.create_dir(Path::new("/elsewhere")).await.unwrap();
        assert_eq!(
            fs.calls().await,
            vec![
                MockCall::Copy("/card/IMG_0001.JPG".into(), "/elsewhere/IMG_0001.JPG".into()),
                MockCall::CreateDir("/elsewhere".into()),
            ]
        );
    }
}
