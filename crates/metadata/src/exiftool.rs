use crate::MetadataProvider;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

/// Executable name looked up on `PATH` by [`ExifTool::discover`].
pub const EXIFTOOL_BINARY: &str = "exiftool";
/// Separator exiftool itself uses when printing list-type tags.
const LIST_SEPARATOR: &str = ", ";

/// Tag names exiftool reads. Anything else (`Tag=value`, `-opt`, `Tag<src`)
/// is an edit or an option and must never reach the command line.
static TAG_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").unwrap());

fn validate_tag(key: &str) -> Result<()> {
    if !TAG_NAME.is_match(key) {
        exn::bail!(ErrorKind::InvalidTag(key.to_string()));
    }
    Ok(())
}

/// Reads metadata by running Phil Harvey's `exiftool` once per file.
///
/// Tag values are requested with `-json` and reported in exiftool's default
/// print conversion, so dates come back as `yyyy:MM:dd HH:mm:ss`.
#[derive(Clone, Debug)]
pub struct ExifTool {
    executable: PathBuf,
}
impl ExifTool {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Search `PATH` for exiftool.
    pub fn discover() -> Result<Self> {
        let executable = which::which(EXIFTOOL_BINARY).or_raise(|| ErrorKind::NotFound(EXIFTOOL_BINARY.into()))?;
        tracing::debug!(exiftool = %executable.display(), "Discovered exiftool on PATH");
        Ok(Self { executable })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, path: &Path, keys: &BTreeSet<String>) -> Command {
        let mut command = Command::new(&self.executable);
        command.arg("-json");
        command.args(keys.iter().map(|key| format!("-{key}")));
        command.arg(path);
        command
    }
}

impl MetadataProvider for ExifTool {
    fn fetch(&self, path: &Path, keys: &BTreeSet<String>) -> Result<HashMap<String, String>> {
        if !path.try_exists().or_raise(|| ErrorKind::Io)? {
            exn::bail!(ErrorKind::SourceMissing(path.to_path_buf()));
        }
        if keys.is_empty() {
            // exiftool would print every tag it knows about.
            return Ok(HashMap::new());
        }
        keys.iter().try_for_each(|key| validate_tag(key))?;
        let output = match self.command(path, keys).output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                exn::bail!(ErrorKind::NotFound(self.executable.clone()))
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
        };
        tracing::trace!(path = %path.display(), status = %output.status, "Ran exiftool");
        // A missing tag can make exiftool exit non-zero while still printing
        // a valid document, so only fall back on the status when parsing fails.
        match parse_output(&output.stdout) {
            Ok(values) => Ok(values),
            Err(e) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                Err(e).or_raise(|| ErrorKind::InvalidOutput(format!("exiftool exited with {}: {stderr}", output.status)))
            },
            Err(e) => Err(e),
        }
    }
}

/// Turns exiftool's `-json` output for a single file into a flat string map.
fn parse_output(stdout: &[u8]) -> Result<HashMap<String, String>> {
    let documents: Vec<Map<String, Value>> =
        serde_json::from_slice(stdout).or_raise(|| ErrorKind::InvalidOutput("not a JSON array of objects".into()))?;
    let Some(document) = documents.into_iter().next() else {
        return Ok(HashMap::new());
    };
    Ok(document
        .into_iter()
        .filter(|(key, _)| key != "SourceFile")
        .filter_map(|(key, value)| stringify(value).map(|value| (key, value)))
        .collect())
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(items.into_iter().filter_map(stringify).collect::<Vec<_>>().join(LIST_SEPARATOR)),
        // Only produced with -struct, which isn't passed.
        object @ Value::Object(_) => Some(object.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_output() {
        let stdout = br#"[{
            "SourceFile": "/card/IMG_0001.JPG",
            "DateTimeOriginal": "2024:01:01 01:02:03",
            "ISO": 200,
            "FNumber": 2.8,
            "Flash": false,
            "Keywords": ["beach", "sunset"],
            "Empty": null
        }]"#;
        let values = parse_output(stdout).unwrap();
        assert_eq!(
            values,
            HashMap::from([
                ("DateTimeOriginal".to_string(), "2024:01:01 01:02:03".to_string()),
                ("ISO".to_string(), "200".to_string()),
                ("FNumber".to_string(), "2.8".to_string()),
                ("Flash".to_string(), "false".to_string()),
                ("Keywords".to_string(), "beach, sunset".to_string()),
            ])
        );
    }

    #[rstest]
    #[case(b"[]")]
    #[case(br#"[{"SourceFile": "a.jpg"}]"#)]
    fn test_parse_output_without_values(#[case] stdout: &[u8]) {
        assert!(parse_output(stdout).unwrap().is_empty());
    }

    #[rstest]
    #[case(b"")]
    #[case(b"Error: File not found - a.jpg")]
    #[case(br#"{"SourceFile": "a.jpg"}"#)]
    fn test_parse_output_invalid(#[case] stdout: &[u8]) {
        let err = parse_output(stdout).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidOutput(_)));
    }

    #[test]
    fn test_command_arguments() {
        let tool = ExifTool::new("/opt/exiftool");
        let keys = BTreeSet::from(["Model".to_string(), "DateTimeOriginal".to_string()]);
        let command = tool.command(Path::new("/card/a.jpg"), &keys);
        assert_eq!(command.get_program(), "/opt/exiftool");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["-json", "-DateTimeOriginal", "-Model", "/card/a.jpg"]);
    }

    #[rstest]
    #[case("Model")]
    #[case("DateTimeOriginal")]
    #[case("GPS_Altitude-Ref")]
    #[case("all")]
    fn test_validate_tag(#[case] key: &str) {
        assert!(validate_tag(key).is_ok());
    }

    #[rstest]
    #[case("Artist=pwned")]
    #[case("all=")]
    #[case("-overwrite_original")]
    #[case("Artist<Model")]
    #[case("EXIF:Model")]
    #[case("Model#")]
    #[case("")]
    fn test_validate_tag_rejects_instructions(#[case] key: &str) {
        let err = validate_tag(key).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTag(k) if k == key));
    }

    #[cfg(unix)]
    #[test]
    fn test_fetch_never_passes_edits_to_exiftool() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();
        let log = dir.path().join("args.log");
        let script = dir.path().join("exiftool");
        std::fs::write(&script, format!("#!/bin/sh\nprintf '%s\\n' \"$@\" >> '{}'\necho '[]'\n", log.display()))
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tool = ExifTool::new(&script);
        let keys = BTreeSet::from(["Artist=pwned".to_string(), "all=".to_string()]);
        let err = tool.fetch(&photo, &keys).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTag(_)));
        // A single bad key keeps the good ones from running too.
        let keys = BTreeSet::from(["Model".to_string(), "all=".to_string()]);
        assert!(tool.fetch(&photo, &keys).is_err());
        assert!(!log.exists());
    }

    #[test]
    fn test_fetch_missing_source() {
        let tool = ExifTool::new("/opt/exiftool");
        let keys = BTreeSet::from(["Model".to_string()]);
        let err = tool.fetch(Path::new("/definitely/not/here.jpg"), &keys).unwrap_err();
        assert!(matches!(&*err, ErrorKind::SourceMissing(_)));
    }

    #[test]
    fn test_fetch_missing_tool() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tool = ExifTool::new("/definitely/not/exiftool");
        let keys = BTreeSet::from(["Model".to_string()]);
        let err = tool.fetch(file.path(), &keys).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if p == Path::new("/definitely/not/exiftool")));
    }
}
