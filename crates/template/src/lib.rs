//! Destination path templates.
//!
//! A template is literal text interspersed with `#category:config#` markers:
//!
//! | Marker                          | Renders as                                   |
//! |---------------------------------|----------------------------------------------|
//! | `#file:name#`                   | File name with extension                     |
//! | `#file:namenoext#`              | File name without extension                  |
//! | `#file:ext#`                    | Extension, without the dot                   |
//! | `#file:path#`                   | Source folder, relative, with trailing `/`   |
//! | `#file:creationdate[:fmt]#`     | Creation date (default `yyyyMMdd`)           |
//! | `#file:modificationdate[:fmt]#` | Modification date (default `yyyyMMdd`)       |
//! | `#exif:Tag[:fmt]#`              | Metadata value, optionally reformatted date  |
//! | `#sequence:global[:width]#`     | Position in the whole batch, 1-based         |
//! | `#sequence:local[:width]#`      | Position within the destination folder       |
//!
//! A `/` outside of a marker is a directory boundary. `#…#` runs whose
//! category isn't one of the above are kept as plain text.
//!
//! # Example
//!
//! ```
//! use shootsort_template::{RenderContext, Template};
//! use std::path::Path;
//!
//! let template: Template = "#file:path#photo #sequence:global:3#.#file:ext#".parse().unwrap();
//! let ctx = RenderContext::new(Path::new("day1/IMG_0001.JPG")).with_global(Some(7));
//! assert_eq!(template.render(&ctx), "day1/photo 007.JPG");
//! assert_eq!(template.to_string(), "#file:path#photo #sequence:global:3#.#file:ext#");
//! ```

mod compile;
mod date;
pub mod error;
mod render;
mod token;

pub use crate::compile::{compile, split_folders};
pub use crate::render::{RenderContext, render};
pub use crate::token::{DEFAULT_DATE_FORMAT, FileProperty, FormatToken, MAX_SEQUENCE_WIDTH, SequenceScope};
use crate::error::Error;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A compiled, immutable template.
///
/// Constructed via [`FromStr`], which compiles eagerly so that syntax errors
/// surface before any file is touched. The same instance is rendered once or
/// twice per imported file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<FormatToken>,
}
impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = compile(s)?;
        tracing::trace!(template = s, tokens = tokens.len(), "Compiled template");
        Ok(Self { tokens })
    }
}
impl From<Vec<FormatToken>> for Template {
    fn from(tokens: Vec<FormatToken>) -> Self {
        Self { tokens }
    }
}
impl Display for Template {
    /// Canonical textual form; compiling it again yields the same tokens.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.tokens.iter().try_for_each(|token| write!(f, "{token}"))
    }
}
impl Template {
    pub fn tokens(&self) -> &[FormatToken] {
        &self.tokens
    }

    /// The distinct metadata keys referenced by the template.
    pub fn metadata_keys(&self) -> BTreeSet<String> {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                FormatToken::MetadataField { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any token refers to the per-folder counter.
    pub fn needs_local_sequence(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, FormatToken::Sequence { scope: SequenceScope::Local, .. }))
    }

    /// Renders every token for one file and concatenates the result.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        self.tokens.iter().map(|token| render(token, ctx)).collect()
    }
}
