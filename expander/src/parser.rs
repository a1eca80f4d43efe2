use std::path::{Path, PathBuf};

use log::debug;
use stitch::{Document, Origin, source};

use crate::cursor::CursorTable;
use crate::error::ExpandError;
use crate::resolver::{self, Frame};
use crate::scope::Scope;
use crate::sections;

/// Default bound on nested template and include depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The document parser. Expands directive blocks and placeholders of
/// documents found under a site root.
///
/// All template, include and input-data paths are resolved against the
/// root. An `Expander` holds no per-document state, so one instance can
/// serve every page of a build.
#[derive(Debug, Clone)]
pub struct Expander {
    root: PathBuf,
    max_depth: usize,
}

impl Expander {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Expander {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `input` to fully expanded markup.
    ///
    /// `input` is a path relative to the root when such a file exists, and
    /// literal markup otherwise. Roots serialize as complete documents;
    /// fragments (`is_root == false`) serialize without the envelope the
    /// HTML parser would inject.
    pub fn parse(&self, input: &str, scope: &Scope, is_root: bool) -> Result<String, ExpandError> {
        self.parse_in(input, scope, is_root, &[])
    }

    /// Parse a file that a directive or include requires to exist.
    pub(crate) fn parse_reference(
        &self,
        path: &str,
        scope: &Scope,
        chain: &[PathBuf],
        referenced_by: &Origin,
    ) -> Result<String, ExpandError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(ExpandError::MissingFile {
                path: full,
                referenced_by: referenced_by.to_string(),
            });
        }
        self.parse_in(path, scope, false, chain)
    }

    pub(crate) fn parse_in(
        &self,
        input: &str,
        scope: &Scope,
        is_root: bool,
        chain: &[PathBuf],
    ) -> Result<String, ExpandError> {
        let candidate = self.root.join(input);
        let (origin, markup, chain) = if candidate.is_file() {
            let chain = self.enter(&candidate, chain)?;
            let markup = source::load(&candidate)?;
            (Origin::File(PathBuf::from(input)), markup, chain)
        } else {
            (Origin::Inline, input.to_string(), chain.to_vec())
        };
        debug!("parsing {} (root: {}, depth: {})", origin, is_root, chain.len());

        let mut document = Document::load(&markup, origin.clone(), is_root);
        sections::expand_templates(self, &mut document, &chain)?;

        let mut cursors = CursorTable::new();
        sections::expand_repeats(&document, scope, &mut cursors)?;

        let serialized = document.serialize()?;
        let frame = Frame {
            expander: self,
            origin: &origin,
            scope,
            chain: &chain,
        };
        resolver::resolve_placeholders(&frame, &mut cursors, &serialized)
    }

    /// Expand every template block of `document`. Returns how many blocks
    /// were expanded; a document already expanded yields 0.
    pub fn expand_templates(&self, document: &mut Document) -> Result<usize, ExpandError> {
        sections::expand_templates(self, document, &[])
    }

    /// Expand every repeat block of `document` against `scope`, starting a
    /// cursor in `cursors` for each list. Returns how many blocks were
    /// expanded.
    pub fn expand_repeats(
        &self,
        document: &Document,
        scope: &Scope,
        cursors: &mut CursorTable,
    ) -> Result<usize, ExpandError> {
        sections::expand_repeats(document, scope, cursors)
    }

    /// Push `file` onto the call chain, rejecting cycles and runaway depth.
    fn enter(&self, file: &Path, chain: &[PathBuf]) -> Result<Vec<PathBuf>, ExpandError> {
        let canonical = file.canonicalize().map_err(|source| ExpandError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        if let Some(pos) = chain.iter().position(|p| *p == canonical) {
            let names: Vec<String> = chain[pos..]
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| self.display_path(p))
                .collect();
            return Err(ExpandError::CyclicReference {
                chain: names.join(" -> "),
            });
        }
        if chain.len() >= self.max_depth {
            return Err(ExpandError::RecursionLimit {
                limit: self.max_depth,
                path: file.to_path_buf(),
            });
        }
        let mut next = chain.to_vec();
        next.push(canonical);
        Ok(next)
    }

    fn display_path(&self, path: &Path) -> String {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        path.strip_prefix(&root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
