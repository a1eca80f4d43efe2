use std::io;
use std::path::PathBuf;

use codespan_reporting::diagnostic::Diagnostic;
use thiserror::Error;

/// Failures while loading, converting, or serializing markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("unsupported template type '{extension}' for '{}' (expected .md or .html)", .path.display())]
    UnsupportedKind { path: PathBuf, extension: String },

    #[error("cannot read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot serialize markup: {0}")]
    Serialize(#[source] io::Error),
}

impl MarkupError {
    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::error().with_message(self.to_string());
        match self {
            MarkupError::UnsupportedKind { .. } => diagnostic
                .with_notes(vec!["templates and includes must be Markdown or HTML files".into()]),
            _ => diagnostic,
        }
    }
}

/// A placeholder tag whose expression does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed placeholder `{text}`: {reason}")]
pub struct TagError {
    pub text: String,
    pub reason: &'static str,
}
