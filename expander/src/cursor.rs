use std::collections::{HashMap, HashSet};

/// Iteration state for one repeated list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
    /// Fields of the current record already emitted.
    pub consumed: HashSet<String>,
}

/// Cursors for the repeated lists of one `parse` call.
///
/// The placeholder grammar has no loop variable. A record cursor advances
/// when a field is requested a second time before the record is left,
/// i.e. `{{{a:xs}}}{{{b:xs}}}{{{a:xs}}}` reads `xs[0].a`, `xs[0].b`, `xs[1].a`.
#[derive(Debug, Default)]
pub struct CursorTable {
    cursors: HashMap<String, Cursor>,
}

impl CursorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) iteration over `list` at its first element.
    pub fn start(&mut self, list: &str) {
        self.cursors.insert(list.to_string(), Cursor::default());
    }

    pub fn get(&self, list: &str) -> Option<&Cursor> {
        self.cursors.get(list)
    }

    pub fn is_active(&self, list: &str) -> bool {
        self.cursors.contains_key(list)
    }

    /// Index for a `{{{#:list}}}` read; the cursor moves past it.
    /// `None` when no repeat block started this list.
    pub fn next_item(&mut self, list: &str) -> Option<usize> {
        let cursor = self.cursors.get_mut(list)?;
        let index = cursor.index;
        cursor.index += 1;
        Some(index)
    }

    /// Index for a `{{{field:list}}}` read, advancing to the next record
    /// first if `field` was already emitted for the current one.
    pub fn next_field(&mut self, list: &str, field: &str) -> Option<usize> {
        let cursor = self.cursors.get_mut(list)?;
        if cursor.consumed.contains(field) {
            cursor.index += 1;
            cursor.consumed.clear();
        }
        cursor.consumed.insert(field.to_string());
        Some(cursor.index)
    }
}
