use crate::error::Result;
use crate::token::{FileProperty, FormatToken, SequenceScope, split_config};
use regex::Regex;
use std::sync::LazyLock;

/// `#category:config#` where the category is one we understand. Any other
/// `#…#` run is left alone and ends up as literal text.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?<category>file|exif|sequence):(?<config>[^#]+)#").unwrap());

/// Compiles a template string into its ordered token list.
///
/// Literal text between markers is broken up by [`split_folders`] so that
/// every `/` outside a marker becomes a [`FormatToken::PathSeparator`]. Empty
/// literal segments carry no information and are dropped.
pub fn compile(template: &str) -> Result<Vec<FormatToken>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    for captures in MARKER.captures_iter(template) {
        // Infallible: group 0 always exists for a match.
        let Some(marker) = captures.get(0) else { continue };
        push_literal(&mut tokens, &template[cursor..marker.start()]);
        tokens.push(marker_token(&captures["category"], &captures["config"])?);
        cursor = marker.end();
    }
    push_literal(&mut tokens, &template[cursor..]);
    Ok(tokens)
}

/// Splits literal text on `/`, keeping empty segments so that leading,
/// trailing and doubled separators stay visible.
///
/// ```
/// use shootsort_template::{FormatToken, split_folders};
///
/// assert_eq!(
///     split_folders("folder//file"),
///     vec![
///         FormatToken::literal("folder"),
///         FormatToken::PathSeparator,
///         FormatToken::literal(""),
///         FormatToken::PathSeparator,
///         FormatToken::literal("file"),
///     ]
/// );
/// ```
pub fn split_folders(path: &str) -> Vec<FormatToken> {
    let mut tokens = Vec::new();
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            tokens.push(FormatToken::PathSeparator);
        }
        tokens.push(FormatToken::literal(segment));
    }
    tokens
}

fn push_literal(tokens: &mut Vec<FormatToken>, text: &str) {
    tokens.extend(split_folders(text).into_iter().filter(|t| !matches!(t, FormatToken::Literal(s) if s.is_empty())));
}

fn marker_token(category: &str, config: &str) -> Result<FormatToken> {
    Ok(match category {
        "file" => FormatToken::FileAttribute(FileProperty::parse(config)?),
        "exif" => {
            let (key, format) = split_config(config);
            FormatToken::metadata(key, format)
        },
        "sequence" => {
            let (scope, width) = SequenceScope::parse(config)?;
            FormatToken::Sequence { scope, width }
        },
        // Unreachable with the current pattern, but stays correct if the
        // category alternation ever grows faster than this match.
        _ => FormatToken::Literal(format!("#{category}:{config}#")),
    })
}
