//! Line-oriented resolution of placeholder tags in serialized markup.

use std::path::PathBuf;

use stitch::tag::{Tag, TagMatch, VariableRef, next_tag};
use stitch::{Origin, SourceKind, markdown, source};

use crate::cursor::CursorTable;
use crate::error::{ExpandError, Unresolved};
use crate::parser::Expander;
use crate::scope::Scope;
use crate::value::Value;

/// What placeholder resolution can see during one `parse` call.
pub(crate) struct Frame<'a> {
    pub expander: &'a Expander,
    pub origin: &'a Origin,
    pub scope: &'a Scope,
    pub chain: &'a [PathBuf],
}

/// Replace every placeholder tag in `markup`, line by line.
///
/// Within a line the earliest tag is resolved first and scanning resumes
/// after the inserted text, so a resolved value is never rescanned.
pub(crate) fn resolve_placeholders(
    frame: &Frame<'_>,
    cursors: &mut CursorTable,
    markup: &str,
) -> Result<String, ExpandError> {
    let mut output = String::with_capacity(markup.len());
    for (index, line) in markup.split_inclusive('\n').enumerate() {
        resolve_line(frame, cursors, line, index + 1, &mut output)?;
    }
    Ok(output)
}

fn resolve_line(
    frame: &Frame<'_>,
    cursors: &mut CursorTable,
    line: &str,
    line_no: usize,
    output: &mut String,
) -> Result<(), ExpandError> {
    let mut line = line.to_string();
    let mut from = 0;
    loop {
        let found = next_tag(&line, from).map_err(|source| ExpandError::MalformedTag {
            origin: frame.origin.to_string(),
            line: line_no,
            source,
        })?;
        let Some(TagMatch { span, tag }) = found else {
            break;
        };
        let text = &line[span.clone()];

        let replacement = match &tag {
            Tag::Include { kind, path } => resolve_include(frame, kind, path, text, line_no)?,
            Tag::Variable(variable) => resolve_variable(frame.scope, cursors, variable)
                .map_err(|reason| ExpandError::UnresolvedPlaceholder {
                    origin: frame.origin.to_string(),
                    line: line_no,
                    tag: text.to_string(),
                    reason,
                })?,
        };

        line.replace_range(span.clone(), &replacement);
        // Resume after the inserted value; resolved text is never rescanned.
        from = span.start + replacement.len();
    }
    output.push_str(&line);
    Ok(())
}

fn resolve_include(
    frame: &Frame<'_>,
    kind: &str,
    path: &str,
    text: &str,
    line_no: usize,
) -> Result<String, ExpandError> {
    let Some(kind) = SourceKind::from_tag_name(kind) else {
        return Err(ExpandError::UnsupportedInclude {
            origin: frame.origin.to_string(),
            line: line_no,
            tag: text.to_string(),
            kind: kind.to_string(),
        });
    };
    match kind {
        SourceKind::Markdown => {
            let full = frame.expander.root().join(path);
            if !full.is_file() {
                return Err(ExpandError::MissingFile {
                    path: full,
                    referenced_by: format!("{} (line {})", frame.origin, line_no),
                });
            }
            Ok(markdown::to_html(&source::read(&full)?))
        }
        // html includes share the caller's scope, unlike template blocks
        SourceKind::Html => {
            frame
                .expander
                .parse_reference(path, frame.scope, frame.chain, frame.origin)
        }
    }
}

/// Resolve a variable tag against the scope and the repeat cursors.
pub(crate) fn resolve_variable(
    scope: &Scope,
    cursors: &mut CursorTable,
    variable: &VariableRef,
) -> Result<String, Unresolved> {
    match variable {
        VariableRef::Name(name) => scope
            .get(name)
            .map(Value::to_placeholder_string)
            .ok_or_else(|| Unresolved::Unbound(name.clone())),

        VariableRef::Item { list } => {
            let index = cursors
                .next_item(list)
                .ok_or_else(|| Unresolved::NoCursor(list.clone()))?;
            let items = scope.list(list)?;
            let item = element(items, list, index)?;
            if !item.is_scalar() {
                return Err(Unresolved::NotAScalar {
                    list: list.clone(),
                    index,
                    found: item.type_name(),
                });
            }
            Ok(item.to_placeholder_string())
        }

        VariableRef::Field { field, list } => {
            let index = cursors
                .next_field(list, field)
                .ok_or_else(|| Unresolved::NoCursor(list.clone()))?;
            let items = scope.list(list)?;
            match element(items, list, index)? {
                Value::Record(fields) => fields
                    .get(field)
                    .map(Value::to_placeholder_string)
                    .ok_or_else(|| Unresolved::MissingField {
                        field: field.clone(),
                        list: list.clone(),
                        index,
                    }),
                other => Err(Unresolved::NotARecord {
                    list: list.clone(),
                    index,
                    found: other.type_name(),
                }),
            }
        }
    }
}

fn element<'a>(items: &'a [Value], list: &str, index: usize) -> Result<&'a Value, Unresolved> {
    items.get(index).ok_or_else(|| Unresolved::OutOfRange {
        list: list.to_string(),
        index,
        len: items.len(),
    })
}
