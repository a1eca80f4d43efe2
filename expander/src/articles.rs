//! Markdown content embedded into `<article id="...">` elements.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use stitch::{Document, Origin, markdown, source};
use walkdir::WalkDir;

use crate::error::ExpandError;

/// Markdown files of a content directory, keyed by file stem. A page's
/// `<article id="intro">` receives `intro.md` from anywhere in the tree.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    entries: BTreeMap<String, PathBuf>,
}

impl ContentIndex {
    /// Index every `.md` file under `dir`. A missing directory yields an
    /// empty index. When two files share a stem, the first in sorted walk
    /// order wins.
    pub fn scan(dir: &Path) -> Result<Self, ExpandError> {
        let mut entries = BTreeMap::new();
        if !dir.is_dir() {
            debug!("no content directory at {}", dir.display());
            return Ok(ContentIndex { entries });
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                ExpandError::Io {
                    path,
                    source: e.into(),
                }
            })?;
            let path = entry.path();
            let is_markdown = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("md"));
            if !entry.file_type().is_file() || !is_markdown {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(existing) = entries.get(id) {
                warn!(
                    "ignoring {}: article '{}' already comes from {}",
                    path.display(),
                    id,
                    existing.display()
                );
                continue;
            }
            entries.insert(id.to_string(), path.to_path_buf());
        }
        Ok(ContentIndex { entries })
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append the rendered content of each matching article in the root
    /// document `markup`. The content is inserted as is; placeholders in
    /// it are not resolved.
    pub fn embed(&self, markup: &str, origin: &Origin) -> Result<String, ExpandError> {
        if self.is_empty() {
            return Ok(markup.to_string());
        }
        let document = Document::load(markup, origin.clone(), true);
        let embedded = document.embed_articles(|id| -> Result<Option<String>, ExpandError> {
            match self.get(id) {
                Some(path) => Ok(Some(markdown::to_html(&source::read(path)?))),
                None => Ok(None),
            }
        })?;
        if embedded == 0 {
            return Ok(markup.to_string());
        }
        debug!("{}: embedded {} article(s)", origin, embedded);
        Ok(document.serialize()?)
    }
}
