mod cli;

use crate::cli::{Cli, Command, ImportArgs};
use clap::Parser;
use derive_more::{Display, Error};
use exn::ResultExt;
use shootsort_config::Config;
use shootsort_library::error::{Error as LibraryError, ErrorKind as LibraryErrorKind};
use shootsort_library::{Context, import};
use shootsort_metadata::{ExifTool, MetadataHandle, NoMetadata};
use shootsort_storage::backend::LocalFilesystem;
use shootsort_storage::{FilesystemHandle, TransferMode};
use shootsort_template::Template;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

type Error = exn::Exn<ErrorKind>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("invalid template")]
    Template,
    #[display("the template needs exiftool, but none is configured (use --exiftool or the config file)")]
    MetadataNotConfigured,
    #[display("import failed")]
    Import,
}
impl ErrorKind {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Template => 2,
            Self::MetadataNotConfigured => 3,
            Self::Config | Self::Import => 1,
        }
    }

    /// Lifts a library error, keeping the distinctions the exit code cares about.
    #[track_caller]
    fn from_library(err: LibraryError) -> Error {
        let kind = match &*err {
            LibraryErrorKind::Template => Self::Template,
            LibraryErrorKind::MetadataNotConfigured => Self::MetadataNotConfigured,
            _ => Self::Import,
        };
        err.raise(kind)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(err.exit_code())
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Import(args) => run_import(config, args).await,
        Command::Template { template } => show_template(&template),
    }
}

async fn run_import(config: Config, args: ImportArgs) -> Result<()> {
    let template = args.template.as_deref().unwrap_or(&config.template);
    let filters = if args.filters.is_empty() { &config.filters } else { &args.filters };
    let mode = if args.move_files { TransferMode::Move } else { config.mode };
    let ctx = Context::new(template)
        .and_then(|ctx| ctx.with_filters(filters))
        .map_err(ErrorKind::from_library)?
        .with_mode(mode)
        .with_recursive(config.recursive && !args.no_recursive)
        .with_dry_run(args.dry_run);

    let fs: FilesystemHandle = Arc::new(LocalFilesystem::default());
    let metadata = metadata_provider(args.exiftool.or(config.exiftool));
    let summary = import(&fs, &metadata, &ctx, &args.source, &args.destination)
        .await
        .map_err(ErrorKind::from_library)?;

    if ctx.dry_run {
        for pair in &summary.planned {
            println!("{} -> {}", pair.source.display(), pair.destination.display());
        }
        println!("{} files would be imported", summary.planned.len());
    } else {
        println!("{} files imported", summary.placed);
    }
    Ok(())
}

/// An explicitly configured exiftool always wins; otherwise try `PATH`. If
/// neither works, imports still run as long as the template needs no metadata.
fn metadata_provider(exiftool: Option<std::path::PathBuf>) -> MetadataHandle {
    if let Some(path) = exiftool {
        return Arc::new(ExifTool::new(path));
    }
    match ExifTool::discover() {
        Ok(tool) => Arc::new(tool),
        Err(err) => {
            tracing::debug!(error = %*err, "No exiftool available");
            Arc::new(NoMetadata)
        },
    }
}

fn show_template(template: &str) -> Result<()> {
    let template = template.parse::<Template>().or_raise(|| ErrorKind::Template)?;
    println!("{template}");
    for token in template.tokens() {
        println!("  {token:?}");
    }
    let keys = template.metadata_keys();
    if !keys.is_empty() {
        println!("metadata: {}", keys.into_iter().collect::<Vec<_>>().join(", "));
    }
    Ok(())
}
