use crate::error::{ErrorKind, Result};
use crate::{ImportPair, place, plan};
use exn::ResultExt;
use shootsort_metadata::MetadataHandle;
use shootsort_storage::{FilesystemHandle, MimeFilter, TransferMode};
use shootsort_template::Template;
use std::path::Path;
use tracing::instrument;

/// Everything about an import that isn't a path.
#[derive(Clone, Debug)]
pub struct Context {
    pub template: Template,
    pub mode: TransferMode,
    pub filter: MimeFilter,
    pub recursive: bool,
    /// Plan only; nothing is written.
    pub dry_run: bool,
}
impl Context {
    /// Compiles the template straight away so that a bad template is
    /// reported before anything is read.
    pub fn new(template: &str) -> Result<Self> {
        let template = template.parse::<Template>().or_raise(|| ErrorKind::Template)?;
        Ok(Self {
            template,
            mode: TransferMode::default(),
            filter: MimeFilter::any(),
            recursive: true,
            dry_run: false,
        })
    }

    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filters(mut self, patterns: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        self.filter = MimeFilter::new(patterns).or_raise(|| ErrorKind::Filter)?;
        Ok(self)
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of a successful [`import`].
#[derive(Clone, Debug, Default)]
pub struct Summary {
    /// Every planned transfer, in placement order.
    pub planned: Vec<ImportPair>,
    /// Files actually placed; zero for a dry run.
    pub placed: usize,
}

/// Imports every matching file under `source_root` into `destination_root`.
///
/// Enumeration and planning finish before the first write, so errors from
/// either leave the destination untouched.
#[instrument(skip(fs, metadata, ctx), fields(mode = %ctx.mode, dry_run = ctx.dry_run))]
pub async fn import(
    fs: &FilesystemHandle,
    metadata: &MetadataHandle,
    ctx: &Context,
    source_root: &Path,
    destination_root: &Path,
) -> Result<Summary> {
    let files = fs
        .find_files(source_root, &ctx.filter, ctx.recursive)
        .await
        .or_raise(|| ErrorKind::Enumerate)?;
    tracing::info!(files = files.len(), "Found files to import");

    let planned = plan(files, &ctx.template, metadata, destination_root).await?;
    if ctx.dry_run {
        return Ok(Summary { planned, placed: 0 });
    }
    let placed = place(fs, &planned, ctx.mode).await?;
    Ok(Summary { planned, placed })
}
