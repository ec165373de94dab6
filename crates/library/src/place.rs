use crate::ImportPair;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shootsort_storage::error::ErrorKind as StorageErrorKind;
use shootsort_storage::{FilesystemHandle, TransferMode};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Copies or moves every planned file into place, in order.
///
/// Destination folders are created up front, once each. A destination that
/// is already taken is never overwritten; the file gets the first free name
/// from [`with_suffix`] instead. Any other failure stops the batch and files
/// already placed stay where they are.
///
/// Returns the number of files placed, which is always `pairs.len()`.
#[instrument(skip_all, fields(pairs = pairs.len(), %mode, filesystem = fs.name()))]
pub async fn place(fs: &FilesystemHandle, pairs: &[ImportPair], mode: TransferMode) -> Result<usize> {
    let folders: BTreeSet<&Path> = pairs.iter().filter_map(|pair| pair.destination.parent()).collect();
    for folder in folders {
        fs.create_dir(folder).await.or_raise(|| ErrorKind::Transfer)?;
    }
    for pair in pairs {
        transfer(fs, pair, mode).await?;
    }
    tracing::info!(files = pairs.len(), "Placed files");
    Ok(pairs.len())
}

async fn transfer(fs: &FilesystemHandle, pair: &ImportPair, mode: TransferMode) -> Result<PathBuf> {
    let mut destination = pair.destination.clone();
    // Unbounded: the only ways out are success or a different error.
    for suffix in 1u64.. {
        let transferred = match mode {
            TransferMode::Copy => fs.copy(&pair.source, &destination).await,
            TransferMode::Move => fs.rename(&pair.source, &destination).await,
        };
        match transferred {
            Ok(()) => break,
            Err(e) if matches!(&*e, StorageErrorKind::AlreadyExists(_)) => {
                destination = with_suffix(&pair.destination, suffix);
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Transfer),
        }
    }
    if destination != pair.destination {
        tracing::info!(
            source = %pair.source.display(),
            planned = %pair.destination.display(),
            destination = %destination.display(),
            "Destination taken, renamed"
        );
    } else {
        tracing::debug!(source = %pair.source.display(), destination = %destination.display(), %mode, "Placed file");
    }
    Ok(destination)
}

/// Inserts ` <n>` between a file's stem and its extension.
///
/// ```
/// use shootsort_library::with_suffix;
/// use std::path::Path;
///
/// assert_eq!(with_suffix(Path::new("/photos/photo.jpg"), 1), Path::new("/photos/photo 1.jpg"));
/// assert_eq!(with_suffix(Path::new("/photos/photo"), 12), Path::new("/photos/photo 12"));
/// ```
pub fn with_suffix(path: &Path, n: u64) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!(" {n}"));
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    path.with_file_name(name)
}
