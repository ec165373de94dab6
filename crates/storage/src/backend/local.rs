//! Local filesystem backend.
//!
//! Uses `tokio::fs` for all I/O. Destination writes are no-clobber: copies
//! open the target with `create_new`, renames check for the target first.

use super::{SourceFileStream, is_hidden};
use crate::error::{ErrorKind, Result};
use crate::{Filesystem, MimeFilter, SourceFile, local_timestamp};
use async_stream::stream;
use async_trait::async_trait;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tokio::io::AsyncWriteExt;

enum WalkEntry {
    File(SourceFile),
    Descend(PathBuf),
    Skip,
}

/// The machine's own filesystem.
///
/// # Examples
///
/// ```no_run
/// use shootsort_storage::backend::LocalFilesystem;
/// use shootsort_storage::{Filesystem, MimeFilter};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = LocalFilesystem::default();
/// let files = fs.find_files(Path::new("/media/card/DCIM"), &MimeFilter::any(), true).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalFilesystem {
    name: String,
}
impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new("local")
    }
}
impl LocalFilesystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn source_file(root: &Path, path: &Path, metadata: &Metadata) -> Result<SourceFile> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| ErrorKind::InvalidPath(path.to_path_buf()))?;
        let created = metadata.created().ok().map(local_timestamp);
        let modified = metadata.modified().ok().map(local_timestamp);
        Ok(SourceFile::new(root, relative).with_dates(created, modified))
    }

    /// Classifies one directory entry. Kept out of the stream body so errors
    /// can be propagated with `?` and yielded once by the caller.
    async fn process_entry(root: &Path, entry: DirEntry, filter: &MimeFilter, recursive: bool) -> Result<WalkEntry> {
        if is_hidden(&entry.file_name()) {
            return Ok(WalkEntry::Skip);
        }
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| ErrorKind::from_io(e, &path))?;
        if file_type.is_dir() {
            return Ok(if recursive { WalkEntry::Descend(path) } else { WalkEntry::Skip });
        }
        if !filter.matches(&path) {
            return Ok(WalkEntry::Skip);
        }
        // Follows symlinks, but only to files; linked directories are never
        // entered so the walk can't loop.
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            // Most likely a broken symlink.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(WalkEntry::Skip),
            Err(e) => exn::bail!(ErrorKind::from_io(e, &path)),
        };
        if !metadata.is_file() {
            return Ok(WalkEntry::Skip);
        }
        Ok(WalkEntry::File(Self::source_file(root, &path, &metadata)?))
    }

    async fn copy_contents(from: &Path, to: &Path) -> Result<()> {
        let mut source = fs::File::open(from).await.map_err(|e| ErrorKind::from_io(e, from))?;
        let mut target = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(to)
            .await
            .map_err(|e| ErrorKind::from_io(e, to))?;
        let copied = async {
            tokio::io::copy(&mut source, &mut target).await?;
            target.flush().await?;
            let permissions = source.metadata().await?.permissions();
            target.set_permissions(permissions).await
        }
        .await;
        if let Err(e) = copied {
            // Don't leave a truncated file behind to be mistaken for an import.
            drop(target);
            if let Err(cleanup) = fs::remove_file(to).await {
                tracing::warn!(path = %to.display(), error = %cleanup, "Failed to remove partial copy");
            }
            exn::bail!(ErrorKind::from_io(e, to));
        }
        Ok(())
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_stream<'a>(&'a self, root: &'a Path, filter: &'a MimeFilter, recursive: bool) -> SourceFileStream<'a> {
        let mut stack = vec![root.to_path_buf()];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // A directory vanishing mid-walk isn't worth failing the
                    // batch over, but a missing root is.
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound && current != root => continue 'dirs,
                    Err(e) => {
                        yield Err(exn::Exn::from(ErrorKind::from_io(e, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(ErrorKind::from_io(e, &current))); continue 'entries; },
                    };
                    match Self::process_entry(root, entry, filter, recursive).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        Ok(fs::create_dir_all(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::trace!(from = %from.display(), to = %to.display(), "Copying file");
        Self::copy_contents(from, to).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        // POSIX rename replaces its target, so check first. Racy against
        // other writers, but nothing else should be writing mid-import.
        if fs::try_exists(to).await.map_err(|e| ErrorKind::from_io(e, to))? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                tracing::debug!(from = %from.display(), to = %to.display(), "Rename crosses devices, copying instead");
                Self::copy_contents(from, to).await?;
                Ok(fs::remove_file(from).await.map_err(|e| ErrorKind::from_io(e, from))?)
            },
            Err(e) => Err(ErrorKind::from_io(e, from).into()),
        }
    }
}
