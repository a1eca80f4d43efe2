//! Lexing of inline placeholder tags.
//!
//! Two syntaxes exist:
//!
//! ```text
//! <<<md:path/to/file.md>>>     file include (also in its &lt;&lt;&lt; escaped form)
//! {{{name}}}                   plain variable
//! {{{#:list}}}                 next scalar of a repeated list
//! {{{field:list}}}             field of the current record of a repeated list
//! ```
//!
//! The lexer only finds and classifies tags; resolving them is the
//! expander's job.

use std::ops::Range;

use crate::error::TagError;
use crate::source::{
    ESCAPED_INCLUDE_CLOSE, ESCAPED_INCLUDE_OPEN, RAW_INCLUDE_CLOSE, RAW_INCLUDE_OPEN,
    is_include_body,
};

const VARIABLE_OPEN: &str = "{{{";
const VARIABLE_CLOSE: &str = "}}}";

/// A classified placeholder tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `<<<kind:path>>>`. The kind is kept verbatim so unknown kinds can be
    /// reported by name.
    Include { kind: String, path: String },
    Variable(VariableRef),
}

/// The expression inside a `{{{...}}}` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableRef {
    /// `{{{name}}}`
    Name(String),
    /// `{{{#:list}}}`
    Item { list: String },
    /// `{{{field:list}}}`
    Field { field: String, list: String },
}

impl VariableRef {
    /// The repeated list this reference iterates, if any.
    pub fn list(&self) -> Option<&str> {
        match self {
            VariableRef::Name(_) => None,
            VariableRef::Item { list } | VariableRef::Field { list, .. } => Some(list),
        }
    }
}

/// A tag found in a line, with its byte span in that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub span: Range<usize>,
    pub tag: Tag,
}

#[derive(Clone, Copy)]
enum Opener {
    Variable,
    RawInclude,
    EscapedInclude,
}

impl Opener {
    const ALL: [Opener; 3] = [Opener::Variable, Opener::RawInclude, Opener::EscapedInclude];

    fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Opener::Variable => (VARIABLE_OPEN, VARIABLE_CLOSE),
            Opener::RawInclude => (RAW_INCLUDE_OPEN, RAW_INCLUDE_CLOSE),
            Opener::EscapedInclude => (ESCAPED_INCLUDE_OPEN, ESCAPED_INCLUDE_CLOSE),
        }
    }
}

/// Find the earliest tag in `line` starting at byte offset `from`.
///
/// An opener without a matching closer on the same line is plain text. An
/// include body that is not `kind:path` is plain text too, but a variable
/// tag with a malformed expression is an error: `{{{` never occurs in
/// authored markup by accident.
pub fn next_tag(line: &str, from: usize) -> Result<Option<TagMatch>, TagError> {
    let mut search = from;
    while search < line.len() {
        let Some((start, opener)) = earliest_opener(line, search) else {
            return Ok(None);
        };
        let (open, close) = opener.delimiters();
        let body_start = start + open.len();
        let Some(body_len) = line[body_start..].find(close) else {
            search = start + 1;
            continue;
        };
        let body = &line[body_start..body_start + body_len];
        let span = start..body_start + body_len + close.len();

        match opener {
            Opener::Variable => {
                let variable = parse_variable(body).map_err(|reason| TagError {
                    text: line[span.clone()].to_string(),
                    reason,
                })?;
                return Ok(Some(TagMatch {
                    span,
                    tag: Tag::Variable(variable),
                }));
            }
            Opener::RawInclude | Opener::EscapedInclude => {
                if let Some(tag) = parse_include(body, matches!(opener, Opener::EscapedInclude)) {
                    return Ok(Some(TagMatch { span, tag }));
                }
                search = start + 1;
            }
        }
    }
    Ok(None)
}

fn earliest_opener(line: &str, from: usize) -> Option<(usize, Opener)> {
    let rest = line.get(from..)?;
    Opener::ALL
        .iter()
        .filter_map(|&opener| {
            let (open, _) = opener.delimiters();
            rest.find(open).map(|pos| (from + pos, opener))
        })
        .min_by_key(|(pos, _)| *pos)
}

fn parse_include(body: &str, escaped: bool) -> Option<Tag> {
    if !is_include_body(body) {
        return None;
    }
    let (kind, path) = body.split_once(':')?;
    let path = path.trim();
    let path = if escaped {
        path.replace("&amp;", "&")
    } else {
        path.to_string()
    };
    Some(Tag::Include {
        kind: kind.to_string(),
        path,
    })
}

fn parse_variable(body: &str) -> Result<VariableRef, &'static str> {
    let parts: Vec<&str> = body.trim().split(':').map(str::trim).collect();
    match parts.as_slice() {
        [name] if name.is_empty() => Err("empty variable name"),
        [name] => Ok(VariableRef::Name(name.to_string())),
        [_, list] if list.is_empty() => Err("empty list name"),
        [field, _] if field.is_empty() => Err("empty field name"),
        ["#", list] => Ok(VariableRef::Item {
            list: list.to_string(),
        }),
        [field, list] => Ok(VariableRef::Field {
            field: field.to_string(),
            list: list.to_string(),
        }),
        _ => Err("expected `name`, `#:list` or `field:list`"),
    }
}
