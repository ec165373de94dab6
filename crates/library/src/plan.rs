use crate::error::{ErrorKind, Result};
use crate::{ImportPair, MAX_METADATA_CONCURRENCY};
use exn::ResultExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use shootsort_metadata::MetadataHandle;
use shootsort_metadata::error::ErrorKind as MetadataErrorKind;
use shootsort_storage::{SourceFile, confine};
use shootsort_template::{RenderContext, Template};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

type Metadata = HashMap<String, String>;

/// Decides where every file in a batch goes.
///
/// Files are numbered in ascending order of their source-relative path,
/// independent of the order they were enumerated or their metadata arrived
/// in, so the same batch always produces the same plan. Metadata is only
/// fetched when the template asks for it, and is fetched for every file
/// before any numbering starts; one failed lookup fails the batch.
///
/// Rendered paths are [confined](confine) to `destination_root`. A file whose
/// destination renders to nothing keeps its own file name.
///
/// Nothing is written.
#[instrument(skip_all, fields(files = files.len(), destination = %destination_root.display()))]
pub async fn plan(
    files: Vec<SourceFile>,
    template: &Template,
    metadata: &MetadataHandle,
    destination_root: &Path,
) -> Result<Vec<ImportPair>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let keys = template.metadata_keys();
    let mut entries: Vec<(SourceFile, Option<Metadata>)> = if keys.is_empty() {
        files.into_iter().map(|file| (file, None)).collect()
    } else {
        fetch_all(files, keys, metadata).await?
    };
    // Lossy identities can collide for non-UTF-8 names; the raw path breaks the tie.
    entries.sort_by(|(a, _), (b, _)| a.identity().cmp(&b.identity()).then_with(|| a.path.cmp(&b.path)));

    let needs_local = template.needs_local_sequence();
    let mut local_counters: HashMap<PathBuf, u64> = HashMap::new();
    let mut pairs = Vec::with_capacity(entries.len());
    for (global, (file, values)) in (1..).zip(entries.iter()) {
        let ctx = RenderContext::new(&file.path)
            .with_dates(file.created, file.modified)
            .with_metadata(values.as_ref())
            .with_global(Some(global));
        let mut rendered = confine(template.render(&ctx));
        if needs_local {
            // Local numbering is scoped by the folder the file lands in when
            // the local counter itself renders as nothing.
            let scope = rendered.parent().map(Path::to_path_buf).unwrap_or_default();
            let counter = local_counters.entry(scope).or_default();
            *counter += 1;
            rendered = confine(template.render(&ctx.with_local(Some(*counter))));
        }
        if rendered.as_os_str().is_empty() {
            tracing::warn!(source = %file.path.display(), "Template rendered an empty path, keeping the file name");
            rendered = file.path.file_name().map(PathBuf::from).unwrap_or_default();
        }
        tracing::trace!(source = %file.path.display(), destination = %rendered.display(), "Planned file");
        pairs.push(ImportPair::new(&file.absolute, destination_root.join(rendered)));
    }
    Ok(pairs)
}

/// Fetches metadata for every file, at most [`MAX_METADATA_CONCURRENCY`] at a
/// time. Returns in completion order.
async fn fetch_all(
    files: Vec<SourceFile>,
    keys: BTreeSet<String>,
    provider: &MetadataHandle,
) -> Result<Vec<(SourceFile, Option<Metadata>)>> {
    let total = files.len();
    let keys = Arc::new(keys);
    let mut pending = files.into_iter().map(|file| fetch_one(file, Arc::clone(&keys), Arc::clone(provider)));
    let mut running = FuturesUnordered::new();
    running.extend(pending.by_ref().take(MAX_METADATA_CONCURRENCY));

    let mut fetched = Vec::with_capacity(total);
    while let Some(result) = running.next().await {
        // Returning early drops every in-flight lookup.
        fetched.push(result?);
        if let Some(next) = pending.next() {
            running.push(next);
        }
    }
    tracing::debug!(files = total, "Fetched metadata");
    Ok(fetched)
}

async fn fetch_one(
    file: SourceFile,
    keys: Arc<BTreeSet<String>>,
    provider: MetadataHandle,
) -> Result<(SourceFile, Option<Metadata>)> {
    let path = file.absolute.clone();
    let fetched = tokio::task::spawn_blocking(move || provider.fetch(&path, &keys))
        .await
        .or_raise(|| ErrorKind::Metadata)?;
    match fetched {
        Ok(values) => {
            tracing::trace!(path = %file.path.display(), values = values.len(), "Fetched file metadata");
            Ok((file, Some(values)))
        },
        Err(e) if matches!(&*e, MetadataErrorKind::NotConfigured) => {
            Err(e).or_raise(|| ErrorKind::MetadataNotConfigured)
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Metadata),
    }
}
