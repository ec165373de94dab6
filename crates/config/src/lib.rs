//! Layered configuration.
//!
//! Values are resolved, lowest precedence first, from:
//! 1. built-in defaults,
//! 2. a configuration file (`config.toml` in the platform config directory,
//!    or a file given explicitly; YAML and JSON are accepted by extension),
//! 3. environment variables prefixed with `SHOOTSORT_` (e.g. `SHOOTSORT_MODE=move`).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use shootsort_storage::TransferMode;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SHOOTSORT_";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_TEMPLATE: &str = "#file:name#";
pub const DEFAULT_FILTER: &str = "image/.+";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the exiftool executable. Looked up on `PATH` when unset.
    pub exiftool: Option<PathBuf>,
    /// Destination template, relative to the destination root.
    pub template: String,
    pub mode: TransferMode,
    /// Descend into subfolders of the source.
    pub recursive: bool,
    /// MIME type expressions; a file is imported if any of them match.
    pub filters: Vec<String>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            exiftool: None,
            template: DEFAULT_TEMPLATE.to_string(),
            mode: TransferMode::Copy,
            recursive: true,
            filters: vec![DEFAULT_FILTER.to_string()],
        }
    }
}

impl Config {
    /// Loads configuration from `file`, or from the default location when
    /// `None`. Only an explicit file is required to exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };
        Self::extract(Self::figment(file.as_deref()))
    }

    /// Location of the configuration file for the current user, if the
    /// platform has a notion of one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "shootsort").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Builds the provider stack without extracting, so callers can merge
    /// in more layers.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Reading configuration file");
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn extract(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::extract(Config::figment(None)).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.template, "#file:name#");
            assert_eq!(config.filters, vec!["image/.+".to_string()]);
            assert!(config.recursive);
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r##"
                exiftool = "/opt/homebrew/bin/exiftool"
                template = "#exif:DateTimeOriginal:yyyy/MM#/#file:name#"
                mode = "move"
                "##,
            )?;
            let config = Config::load(Some(Path::new("config.toml"))).unwrap();
            assert_eq!(config.exiftool, Some(PathBuf::from("/opt/homebrew/bin/exiftool")));
            assert_eq!(config.template, "#exif:DateTimeOriginal:yyyy/MM#/#file:name#");
            assert_eq!(config.mode, TransferMode::Move);
            // Untouched keys keep their defaults.
            assert!(config.recursive);
            Ok(())
        });
    }

    #[rstest]
    #[case("config.yaml", "recursive: false\nfilters: [\"^image/\", \"^video/\"]\n")]
    #[case("config.json", r#"{"recursive": false, "filters": ["^image/", "^video/"]}"#)]
    fn test_other_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = Config::load(Some(Path::new(name))).unwrap();
            assert!(!config.recursive);
            assert_eq!(config.filters, vec!["^image/".to_string(), "^video/".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "mode = \"move\"\nrecursive = true")?;
            jail.set_env("SHOOTSORT_MODE", "copy");
            jail.set_env("SHOOTSORT_RECURSIVE", "false");
            let config = Config::load(Some(Path::new("config.toml"))).unwrap();
            assert_eq!(config.mode, TransferMode::Copy);
            assert!(!config.recursive);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if p == &missing));
    }

    #[test]
    fn test_invalid_value() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "mode = \"teleport\"")?;
            let err = Config::load(Some(Path::new("config.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid));
            Ok(())
        });
    }
}
