use crate::date;
use crate::token::{DEFAULT_DATE_FORMAT, FileProperty, FormatToken, SequenceScope};
use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR_STR, Path};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Everything a token may need to know about the file being rendered.
///
/// Built once per file (and once more when local sequencing is required);
/// cheap to construct since it only borrows.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    /// Path of the source file relative to the source root.
    pub path: &'a Path,
    pub created: Option<OffsetDateTime>,
    pub modified: Option<OffsetDateTime>,
    /// Only present when the template references metadata.
    pub metadata: Option<&'a HashMap<String, String>>,
    pub global: Option<u64>,
    pub local: Option<u64>,
}
impl<'a> RenderContext<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self {
            path,
            created: None,
            modified: None,
            metadata: None,
            global: None,
            local: None,
        }
    }

    pub fn with_dates(mut self, created: Option<OffsetDateTime>, modified: Option<OffsetDateTime>) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<Option<&'a HashMap<String, String>>>) -> Self {
        self.metadata = metadata.into();
        self
    }

    pub fn with_global(mut self, number: Option<u64>) -> Self {
        self.global = number;
        self
    }

    pub fn with_local(mut self, number: Option<u64>) -> Self {
        self.local = number;
        self
    }
}

/// Produces the literal text for a single token.
pub fn render(token: &FormatToken, ctx: &RenderContext<'_>) -> String {
    match token {
        FormatToken::Literal(text) => text.clone(),
        FormatToken::PathSeparator => MAIN_SEPARATOR_STR.to_string(),
        FormatToken::FileAttribute(property) => file_property(property, ctx),
        FormatToken::MetadataField { key, format } => {
            let Some(value) = ctx.metadata.and_then(|m| m.get(key)) else {
                return String::new();
            };
            // Reformatting is best-effort: anything that isn't an EXIF date
            // is returned as-is.
            match format.as_deref().and_then(|f| date::parse_exif(value).map(|d| date::format(d, f))) {
                Some(formatted) => formatted,
                None => value.clone(),
            }
        },
        FormatToken::Sequence { scope, width } => {
            let number = match scope {
                SequenceScope::Global => ctx.global,
                SequenceScope::Local => ctx.local,
            };
            number.map(|n| zero_pad(i128::from(n), width.unwrap_or(1))).unwrap_or_default()
        },
    }
}

/// Left-pads the decimal form of `value` with zeros to `width` characters,
/// sign included. Unlike `format!`, any width is accepted.
pub(crate) fn zero_pad(value: i128, width: usize) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    let fill = width.saturating_sub(sign.len() + digits.len());
    format!("{sign}{}{digits}", "0".repeat(fill))
}

fn file_property(property: &FileProperty, ctx: &RenderContext<'_>) -> String {
    let path = ctx.path;
    let lossy = |s: Option<&std::ffi::OsStr>| s.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    match property {
        FileProperty::Name => lossy(path.file_name()),
        FileProperty::NameNoExt => lossy(path.file_stem()),
        FileProperty::Ext => lossy(path.extension()),
        FileProperty::Path => match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => format!("{}{MAIN_SEPARATOR_STR}", parent.to_string_lossy()),
            None => String::new(),
        },
        FileProperty::CreationDate(format) => file_date(ctx.created, format.as_deref()),
        FileProperty::ModificationDate(format) => file_date(ctx.modified, format.as_deref()),
    }
}

fn file_date(timestamp: Option<OffsetDateTime>, format: Option<&str>) -> String {
    timestamp
        .map(|t| date::format(PrimitiveDateTime::new(t.date(), t.time()), format.unwrap_or(DEFAULT_DATE_FORMAT)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    const PICTURE: &str = "folder/subfolder/picture.jpg";

    fn picture() -> RenderContext<'static> {
        RenderContext::new(Path::new(PICTURE))
    }

    #[rstest]
    #[case(FileProperty::Name, "picture.jpg")]
    #[case(FileProperty::NameNoExt, "picture")]
    #[case(FileProperty::Ext, "jpg")]
    #[case(FileProperty::Path, "folder/subfolder/")]
    fn test_file_properties(#[case] property: FileProperty, #[case] expected: &str) {
        assert_eq!(render(&FormatToken::FileAttribute(property), &picture()), expected);
    }

    #[test]
    fn test_file_properties_at_root() {
        let ctx = RenderContext::new(Path::new("README"));
        assert_eq!(render(&FormatToken::FileAttribute(FileProperty::Path), &ctx), "");
        assert_eq!(render(&FormatToken::FileAttribute(FileProperty::Ext), &ctx), "");
        assert_eq!(render(&FormatToken::FileAttribute(FileProperty::NameNoExt), &ctx), "README");
    }

    #[test]
    fn test_file_dates() {
        let created = datetime!(2024-01-02 03:04:05 UTC);
        let modified = datetime!(2024-02-10 01:02:03 UTC);
        let ctx = picture().with_dates(Some(created), Some(modified));
        assert_eq!(render(&FormatToken::FileAttribute(FileProperty::CreationDate(None)), &ctx), "20240102");
        assert_eq!(
            render(&FormatToken::FileAttribute(FileProperty::ModificationDate(Some("yyyy-MM HHmm".into()))), &ctx),
            "2024-02 0102"
        );
        // Unavailable timestamps render as nothing.
        assert_eq!(render(&FormatToken::FileAttribute(FileProperty::CreationDate(None)), &picture()), "");
    }

    #[test]
    fn test_metadata() {
        let metadata = HashMap::from([
            ("DateTimeOriginal".to_string(), "2024:01:01 01:02:03".to_string()),
            ("ImageSize".to_string(), "1024x768".to_string()),
        ]);
        let ctx = picture().with_metadata(&metadata);
        assert_eq!(render(&FormatToken::metadata("ImageSize", None), &ctx), "1024x768");
        assert_eq!(render(&FormatToken::metadata("DateTimeOriginal", Some("yy/MM")), &ctx), "24/01");
        // Not a date: the raw value is kept.
        assert_eq!(render(&FormatToken::metadata("ImageSize", Some("yy/MM")), &ctx), "1024x768");
        assert_eq!(render(&FormatToken::metadata("CreateDate", None), &ctx), "");
        // Keys are case-sensitive.
        assert_eq!(render(&FormatToken::metadata("imagesize", None), &ctx), "");
    }

    #[test]
    fn test_metadata_without_mapping() {
        assert_eq!(render(&FormatToken::metadata("ImageSize", None), &picture()), "");
    }

    #[rstest]
    #[case(SequenceScope::Global, None, None, "")]
    #[case(SequenceScope::Global, None, Some(1), "1")]
    #[case(SequenceScope::Global, Some(4), Some(42), "0042")]
    #[case(SequenceScope::Global, Some(2), Some(12345), "12345")]
    #[case(SequenceScope::Global, Some(0), Some(7), "7")]
    fn test_global_sequence(
        #[case] scope: SequenceScope,
        #[case] width: Option<usize>,
        #[case] number: Option<u64>,
        #[case] expected: &str,
    ) {
        let ctx = picture().with_global(number).with_local(Some(999));
        assert_eq!(render(&FormatToken::sequence(scope, width), &ctx), expected);
    }

    #[rstest]
    #[case(None, None, "")]
    #[case(None, Some(1), "1")]
    #[case(Some(4), Some(42), "0042")]
    fn test_local_sequence(#[case] width: Option<usize>, #[case] number: Option<u64>, #[case] expected: &str) {
        let ctx = picture().with_local(number).with_global(Some(999));
        assert_eq!(render(&FormatToken::sequence(SequenceScope::Local, width), &ctx), expected);
    }

    #[test]
    fn test_widest_sequence() {
        let ctx = picture().with_global(Some(42));
        let rendered = render(&FormatToken::sequence(SequenceScope::Global, Some(65535)), &ctx);
        assert_eq!(rendered.len(), 65535);
        assert_eq!(rendered.trim_start_matches('0'), "42");
    }

    #[rstest]
    #[case(7, 1, "7")]
    #[case(7, 3, "007")]
    #[case(12345, 2, "12345")]
    #[case(-7, 3, "-07")]
    #[case(0, 0, "0")]
    fn test_zero_pad(#[case] value: i128, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(zero_pad(value, width), expected);
    }

    #[test]
    fn test_literals() {
        assert_eq!(render(&FormatToken::literal("photo "), &picture()), "photo ");
        assert_eq!(render(&FormatToken::PathSeparator, &picture()), MAIN_SEPARATOR_STR);
    }
}
