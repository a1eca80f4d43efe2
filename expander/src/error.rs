use std::io;
use std::path::PathBuf;

use codespan_reporting::diagnostic::Diagnostic;
use stitch::{MarkupError, TagError};
use thiserror::Error;

/// Why a placeholder or repeat list could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unresolved {
    #[error("'{0}' is not bound in this scope")]
    Unbound(String),

    #[error("'{name}' is a {found}, not a list")]
    NotAList { name: String, found: &'static str },

    #[error("no repeat block iterates '{0}'")]
    NoCursor(String),

    #[error("index {index} is past the end of '{list}' ({len} item(s))")]
    OutOfRange {
        list: String,
        index: usize,
        len: usize,
    },

    #[error("'{list}'[{index}] is a {found}, not a record")]
    NotARecord {
        list: String,
        index: usize,
        found: &'static str,
    },

    #[error("'{list}'[{index}] is a {found}, not a scalar")]
    NotAScalar {
        list: String,
        index: usize,
        found: &'static str,
    },

    #[error("'{list}'[{index}] has no field '{field}'")]
    MissingField {
        field: String,
        list: String,
        index: usize,
    },
}

/// A failure that aborts the build of the page being expanded.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("unsupported include kind '{kind}' in `{tag}` ({origin}, line {line})")]
    UnsupportedInclude {
        origin: String,
        line: usize,
        tag: String,
        kind: String,
    },

    #[error("missing file '{}' (referenced by {referenced_by})", .path.display())]
    MissingFile {
        path: PathBuf,
        referenced_by: String,
    },

    #[error("malformed input data in '{}': {source}", .path.display())]
    MalformedInput {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("input data in '{}' must be a JSON object, found {found}", .path.display())]
    InputNotObject { path: PathBuf, found: &'static str },

    #[error("`{directive}` in {origin} is missing its '{attribute}' attribute")]
    MissingAttribute {
        origin: String,
        directive: String,
        attribute: &'static str,
    },

    #[error("unresolved repeat list in `{directive}` ({origin}): {reason}")]
    UnresolvedList {
        origin: String,
        directive: String,
        reason: Unresolved,
    },

    #[error("unresolved placeholder `{tag}` ({origin}, line {line}): {reason}")]
    UnresolvedPlaceholder {
        origin: String,
        line: usize,
        tag: String,
        reason: Unresolved,
    },

    #[error("{source} ({origin}, line {line})")]
    MalformedTag {
        origin: String,
        line: usize,
        source: TagError,
    },

    #[error("cyclic template reference: {chain}")]
    CyclicReference { chain: String },

    #[error("template nesting deeper than {limit} level(s) at '{}'", .path.display())]
    RecursionLimit { limit: usize, path: PathBuf },

    #[error("invalid path '{}': {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl ExpandError {
    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        if let ExpandError::Markup(inner) = self {
            return inner.to_diagnostic();
        }
        let diagnostic = Diagnostic::error().with_message(self.to_string());
        let notes: Vec<String> = match self {
            ExpandError::UnresolvedPlaceholder { reason, .. } => match reason {
                Unresolved::NoCursor(list) => vec![format!(
                    "indexed placeholders need an enclosing <section type=\"repeat\" input=\"{list}\">"
                )],
                Unresolved::Unbound(_) => vec![
                    "templates only see the data from their own `input` file".into(),
                ],
                _ => Vec::new(),
            },
            ExpandError::CyclicReference { .. } | ExpandError::RecursionLimit { .. } => {
                vec!["a template may not include itself, directly or indirectly".into()]
            }
            ExpandError::UnsupportedInclude { .. } => {
                vec!["include tags take the form <<<md:path>>> or <<<html:path>>>".into()]
            }
            _ => Vec::new(),
        };
        diagnostic.with_notes(notes)
    }
}
