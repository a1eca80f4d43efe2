use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::MarkupError;
use crate::markdown;

pub const RAW_INCLUDE_OPEN: &str = "<<<";
pub const RAW_INCLUDE_CLOSE: &str = ">>>";
pub const ESCAPED_INCLUDE_OPEN: &str = "&lt;&lt;&lt;";
pub const ESCAPED_INCLUDE_CLOSE: &str = "&gt;&gt;&gt;";

/// The kinds of source file a template or include may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markdown,
    Html,
}

impl SourceKind {
    /// Select a kind by file extension (`.md` or `.html`).
    pub fn from_path(path: &Path) -> Result<Self, MarkupError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if extension.eq_ignore_ascii_case("md") {
            Ok(SourceKind::Markdown)
        } else if extension.eq_ignore_ascii_case("html") {
            Ok(SourceKind::Html)
        } else {
            Err(MarkupError::UnsupportedKind {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            })
        }
    }

    /// Select a kind by the name used in an include tag (`md` or `html`).
    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "md" => Some(SourceKind::Markdown),
            "html" => Some(SourceKind::Html),
            _ => None,
        }
    }
}

/// Where a document's markup came from, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(PathBuf),
    Inline,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Inline => write!(f, "inline text"),
        }
    }
}

/// Read a source file and convert it to markup according to its extension.
pub fn load(path: &Path) -> Result<String, MarkupError> {
    let kind = SourceKind::from_path(path)?;
    let text = read(path)?;
    debug!("loaded {} ({:?}, {} bytes)", path.display(), kind, text.len());
    Ok(match kind {
        SourceKind::Markdown => markdown::to_html(&protect_include_tags(&text)),
        SourceKind::Html => text,
    })
}

/// Read a file verbatim.
pub fn read(path: &Path) -> Result<String, MarkupError> {
    std::fs::read_to_string(path).map_err(|source| MarkupError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Rewrite `<<<kind:path>>>` include tags into their entity-escaped form.
///
/// The HTML tokenizer would otherwise read `<kind:path>` as a start tag. The
/// escaped form survives parsing as plain text and is serialized back
/// unchanged, where the placeholder resolver picks it up.
pub fn protect_include_tags(markup: &str) -> Cow<'_, str> {
    if !markup.contains(RAW_INCLUDE_OPEN) {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len() + 32);
    let mut rest = markup;
    while let Some(start) = rest.find(RAW_INCLUDE_OPEN) {
        let after = &rest[start + RAW_INCLUDE_OPEN.len()..];
        match after.find(RAW_INCLUDE_CLOSE) {
            Some(end) if is_include_body(&after[..end]) => {
                out.push_str(&rest[..start]);
                out.push_str(ESCAPED_INCLUDE_OPEN);
                out.push_str(&after[..end]);
                out.push_str(ESCAPED_INCLUDE_CLOSE);
                rest = &after[end + RAW_INCLUDE_CLOSE.len()..];
            }
            _ => {
                // not an include; keep the first '<' and look again after it
                out.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// An include body is `kind:path` on a single line with no angle brackets.
pub fn is_include_body(body: &str) -> bool {
    match body.split_once(':') {
        Some((kind, path)) => {
            !kind.is_empty()
                && kind.chars().all(|c| c.is_ascii_alphanumeric())
                && !path.trim().is_empty()
                && !body.contains(['<', '>', '\n'])
        }
        None => false,
    }
}
