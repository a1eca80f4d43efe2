//! Expansion of `template` and `repeat` directive blocks.

use std::path::PathBuf;

use log::debug;
use stitch::{Block, Document};

use crate::cursor::CursorTable;
use crate::error::ExpandError;
use crate::parser::Expander;
use crate::scope::Scope;

/// Expand template blocks in document order until none is left unhandled.
///
/// Each block's children are replaced by its parsed template. The template
/// is parsed with a fresh scope read from the block's `input` file, never
/// with the caller's scope. The nested parse already expanded the
/// template's own blocks; only the block's inner content, moved into the
/// template's `innermarker`, is searched again.
pub(crate) fn expand_templates(
    expander: &Expander,
    document: &mut Document,
    chain: &[PathBuf],
) -> Result<usize, ExpandError> {
    let mut expanded = 0;
    while let Some(block) = document.next_unhandled_template() {
        let origin = document.origin().clone();
        let template = required_attribute(&block, "template", document)?;
        let inner = block.inner_markup()?;

        let scope = match block.attribute("input").filter(|i| !i.trim().is_empty()) {
            Some(input) => Scope::from_file(&expander.root().join(input.trim()), &origin.to_string())?,
            None => Scope::new(),
        };

        let markup = expander.parse_reference(template.trim(), &scope, chain, &origin)?;
        if document.fill_template(&block, &markup, &inner) {
            debug!("{}: inserted inner content into '{}'", origin, template);
        }
        expanded += 1;
    }
    Ok(expanded)
}

/// Expand repeat blocks in document order until none is left.
///
/// A block over a list of N items is replaced by N copies of its inner
/// markup, and a cursor for the list starts at the first item. Nested
/// repeat blocks surface in the copies and are expanded by later
/// iterations.
pub(crate) fn expand_repeats(
    document: &Document,
    scope: &Scope,
    cursors: &mut CursorTable,
) -> Result<usize, ExpandError> {
    let mut expanded = 0;
    while let Some(block) = document.next_repeat() {
        let list = required_attribute(&block, "input", document)?;
        let list = list.trim();
        let count = scope
            .list(list)
            .map_err(|reason| ExpandError::UnresolvedList {
                origin: document.origin().to_string(),
                directive: block.describe(),
                reason,
            })?
            .len();

        let inner = block.inner_markup()?;
        block.replace_with(&inner.repeat(count));
        cursors.start(list);
        debug!("{}: repeated '{}' {} time(s)", document.origin(), list, count);
        expanded += 1;
    }
    Ok(expanded)
}

fn required_attribute(
    block: &Block,
    attribute: &'static str,
    document: &Document,
) -> Result<String, ExpandError> {
    block
        .attribute(attribute)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ExpandError::MissingAttribute {
            origin: document.origin().to_string(),
            directive: block.describe(),
            attribute,
        })
}
