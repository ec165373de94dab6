use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Import a folder of photos into a tree laid out by a template.
#[derive(Debug, Parser)]
#[command(name = "shootsort", version, about)]
pub struct Cli {
    /// More output; repeat for more detail. Ignored when RUST_LOG is set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Configuration file to use instead of the default location.
    #[arg(long, global = true, env = "SHOOTSORT_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy or move every matching file from SOURCE into DESTINATION.
    Import(ImportArgs),
    /// Check a template and show what it compiles to.
    Template {
        /// The template to check, e.g. "#exif:DateTimeOriginal:yyyy/MM#/#file:name#".
        template: String,
    },
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Destination template, relative to DESTINATION.
    #[arg(short, long)]
    pub template: Option<String>,
    /// Move files instead of copying them.
    #[arg(long = "move")]
    pub move_files: bool,
    /// Only import files directly inside SOURCE.
    #[arg(long)]
    pub no_recursive: bool,
    /// Regular expression over the file's MIME type; repeatable. Replaces the configured filters.
    #[arg(long = "filter", value_name = "REGEX")]
    pub filters: Vec<String>,
    /// Path to the exiftool executable.
    #[arg(long, value_name = "PATH")]
    pub exiftool: Option<PathBuf>,
    /// Show where files would go without touching anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_arguments() {
        let cli = Cli::try_parse_from([
            "shootsort",
            "import",
            "/media/card",
            "/photos",
            "-t",
            "#file:name#",
            "--move",
            "--filter",
            "^image/",
            "--filter",
            "^video/",
            "--dry-run",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Import(args) = cli.command else {
            panic!("expected import command");
        };
        assert_eq!(args.source, PathBuf::from("/media/card"));
        assert_eq!(args.destination, PathBuf::from("/photos"));
        assert_eq!(args.template.as_deref(), Some("#file:name#"));
        assert!(args.move_files);
        assert!(!args.no_recursive);
        assert_eq!(args.filters, vec!["^image/".to_string(), "^video/".to_string()]);
        assert!(args.dry_run);
    }

    #[rstest]
    #[case(&["shootsort", "import", "/media/card"])]
    #[case(&["shootsort", "template"])]
    #[case(&["shootsort"])]
    fn test_missing_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
