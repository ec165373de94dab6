//! Filesystem trait and implementations.
//!
//! This module defines the `Filesystem` trait, the small set of operations an
//! import needs: discovering candidate files under a source root and putting
//! files into a destination tree without ever overwriting anything.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalFilesystem;
#[cfg(feature = "mock")]
pub use self::mock::{MockCall, MockFilesystem};
use crate::error::Result;
use crate::{MimeFilter, SourceFile};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type SourceFileStream<'a> = Pin<Box<dyn Stream<Item = Result<SourceFile>> + Send + 'a>>;

/// File names starting with a dot are hidden, and so is everything below a
/// hidden directory.
pub(crate) fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

/// Unified interface over the filesystems an import reads from and writes to.
///
/// # Overwriting
/// Neither [`copy()`](Self::copy) nor [`rename()`](Self::rename) will ever
/// replace an existing file. When the destination is taken they fail with
/// [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) and leave both
/// sides untouched, which is what lets callers probe for a free name.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use shootsort_storage::{Filesystem, MimeFilter, error::Result};
///
/// async fn count_images(fs: &dyn Filesystem) -> Result<usize> {
///     let filter = MimeFilter::new(["image/.+"])?;
///     let files = fs.find_files(Path::new("/media/card"), &filter, true).await?;
///     Ok(files.len())
/// }
/// ```
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Name of the implementation, for logging.
    fn name(&self) -> &str;

    /// List candidate files below `root`.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`find_stream()`](Self::find_stream) into a [`Vec`] before
    /// returning. Order is unspecified.
    async fn find_files(&self, root: &Path, filter: &MimeFilter, recursive: bool) -> Result<Vec<SourceFile>> {
        self.find_stream(root, filter, recursive).try_collect().await
    }

    /// Stream candidate files below `root`, yielding each as it is found.
    ///
    /// Only regular, non-hidden files whose guessed MIME type passes `filter`
    /// are returned. Hidden directories are not entered, and with `recursive`
    /// unset no directory is entered at all. A missing `root` is an error.
    fn find_stream<'a>(&'a self, root: &'a Path, filter: &'a MimeFilter, recursive: bool) -> SourceFileStream<'a>;

    /// Create a directory and any missing parents. Succeeds if it already exists.
    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// Copy a file. The parent of `to` must exist.
    async fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    /// Move a file. The parent of `to` must exist.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;
}
