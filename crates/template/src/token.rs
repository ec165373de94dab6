//! Compiled template tokens.
//!
//! Every token has a canonical textual form (its [`Display`] impl) which the
//! compiler parses back into the same token, so an unmodified template can be
//! edited and re-compiled byte-for-byte.

use crate::error::{ErrorKind, Result};
use std::fmt::{self, Display, Formatter};

/// Date format used by the file date properties when none is given.
pub const DEFAULT_DATE_FORMAT: &str = "yyyyMMdd";
/// Widest padding a `#sequence:…:N#` marker may ask for.
pub const MAX_SEQUENCE_WIDTH: usize = u16::MAX as usize;

/// One element of a compiled template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormatToken {
    /// Verbatim text.
    Literal(String),
    /// Directory boundary.
    PathSeparator,
    /// A property of the source file itself.
    FileAttribute(FileProperty),
    /// A named metadata value, optionally reinterpreted as a date.
    MetadataField { key: String, format: Option<String> },
    /// A batch counter.
    Sequence { scope: SequenceScope, width: Option<usize> },
}
impl FormatToken {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn metadata(key: impl Into<String>, format: Option<&str>) -> Self {
        Self::MetadataField {
            key: key.into(),
            format: format.map(str::to_string),
        }
    }

    pub fn sequence(scope: SequenceScope, width: Option<usize>) -> Self {
        Self::Sequence { scope, width }
    }
}
impl Display for FormatToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::PathSeparator => f.write_str("/"),
            Self::FileAttribute(property) => write!(f, "#file:{property}#"),
            Self::MetadataField { key, format: Some(format) } => write!(f, "#exif:{key}:{format}#"),
            Self::MetadataField { key, format: None } => write!(f, "#exif:{key}#"),
            Self::Sequence { scope, width: Some(width) } => write!(f, "#sequence:{scope}:{width}#"),
            Self::Sequence { scope, width: None } => write!(f, "#sequence:{scope}#"),
        }
    }
}

/// Properties that can be read from the source file without external tools.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileProperty {
    /// File name with extension.
    Name,
    /// File name without extension.
    NameNoExt,
    /// Extension without the leading dot.
    Ext,
    /// Containing folder, relative to the source root, with a trailing separator.
    Path,
    CreationDate(Option<String>),
    ModificationDate(Option<String>),
}
impl FileProperty {
    /// Parses the body of a `#file:…#` marker.
    ///
    /// Only the date properties use the part after the first colon; it is
    /// silently ignored for the others.
    pub(crate) fn parse(body: &str) -> Result<Self> {
        let (name, format) = split_config(body);
        let format = format.map(str::to_string);
        Ok(match name {
            "name" => Self::Name,
            "namenoext" => Self::NameNoExt,
            "ext" => Self::Ext,
            "path" => Self::Path,
            "creationdate" => Self::CreationDate(format),
            "modificationdate" => Self::ModificationDate(format),
            _ => exn::bail!(ErrorKind::InvalidFileProperty(body.to_string())),
        })
    }
}
impl Display for FileProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::NameNoExt => f.write_str("namenoext"),
            Self::Ext => f.write_str("ext"),
            Self::Path => f.write_str("path"),
            Self::CreationDate(Some(format)) => write!(f, "creationdate:{format}"),
            Self::CreationDate(None) => f.write_str("creationdate"),
            Self::ModificationDate(Some(format)) => write!(f, "modificationdate:{format}"),
            Self::ModificationDate(None) => f.write_str("modificationdate"),
        }
    }
}

/// Which counter a [`FormatToken::Sequence`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceScope {
    /// One counter for the whole batch.
    Global,
    /// One counter per destination folder.
    Local,
}
impl SequenceScope {
    /// Parses the body of a `#sequence:…#` marker into a scope and optional
    /// padding width. The width is validated first.
    pub(crate) fn parse(body: &str) -> Result<(Self, Option<usize>)> {
        let (scope, width) = split_config(body);
        let width = width
            .map(|w| {
                w.parse::<usize>()
                    .ok()
                    .filter(|width| *width <= MAX_SEQUENCE_WIDTH)
                    .ok_or_else(|| ErrorKind::InvalidSequenceFormat(w.to_string()))
            })
            .transpose()?;
        let scope = match scope {
            "global" => Self::Global,
            "local" => Self::Local,
            _ => exn::bail!(ErrorKind::InvalidSequenceType(body.to_string())),
        };
        Ok((scope, width))
    }
}
impl Display for SequenceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Splits a marker body on its first colon. An empty remainder counts as absent.
pub(crate) fn split_config(body: &str) -> (&str, Option<&str>) {
    match body.split_once(':') {
        Some((head, tail)) if !tail.is_empty() => (head, Some(tail)),
        Some((head, _)) => (head, None),
        None => (body, None),
    }
}
