use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::articles::ContentIndex;
use crate::error::ExpandError;
use crate::parser::{DEFAULT_MAX_DEPTH, Expander};
use crate::scope::Scope;

/// Everything a site build needs. Relative paths are resolved against
/// `root`.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    /// Files or directories copied verbatim into the output tree.
    pub dependencies: Vec<PathBuf>,
    /// Pages to expand. `.json` entries are page descriptors.
    pub pages: Vec<PathBuf>,
    /// Directory of Markdown files embedded into `<article id>` elements.
    /// Ignored when it does not exist.
    pub content: PathBuf,
    /// Remove the output directory before building.
    pub clean: bool,
    /// Build the remaining pages after one fails.
    pub keep_going: bool,
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            root: PathBuf::from("."),
            output: PathBuf::from("out"),
            dependencies: Vec::new(),
            pages: vec![PathBuf::from("index.html")],
            content: PathBuf::from("markdown_content"),
            clean: false,
            keep_going: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A page that failed while building with `keep_going`.
#[derive(Debug)]
pub struct PageFailure {
    pub page: PathBuf,
    pub error: ExpandError,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    /// Output files written, one per successful page.
    pub written: Vec<PathBuf>,
    /// Number of dependency files copied.
    pub copied: usize,
    pub failures: Vec<PageFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A JSON page descriptor: `{ "template": "...", "config": { ... } }`.
#[derive(Debug, Deserialize)]
struct PageDescriptor {
    template: String,
    #[serde(default)]
    config: serde_json::Map<String, serde_json::Value>,
}

/// Build a site: copy dependencies, then expand and write every page.
///
/// A page is written only after it expanded successfully, so a failing page
/// never leaves partial output behind.
pub fn build(options: &BuildOptions) -> Result<BuildReport, ExpandError> {
    let root = &options.root;
    let output = if options.output.is_absolute() {
        options.output.clone()
    } else {
        root.join(&options.output)
    };

    if options.clean && output.exists() {
        if root.starts_with(&output) {
            return Err(ExpandError::InvalidPath {
                path: output,
                reason: "refusing to clean a directory containing the site root",
            });
        }
        info!("Cleaning {}", output.display());
        fs::remove_dir_all(&output).map_err(|source| io_error(&output, source))?;
    }
    fs::create_dir_all(&output).map_err(|source| io_error(&output, source))?;

    let mut report = BuildReport::default();

    for dependency in &options.dependencies {
        let relative = site_relative(dependency)?;
        report.copied += copy_dependency(root, &relative, &output)?;
    }

    let articles = ContentIndex::scan(&root.join(site_relative(&options.content)?))?;
    if !articles.is_empty() {
        info!("Found {} article(s) in {}", articles.len(), options.content.display());
    }

    let expander = Expander::new(root.clone()).with_max_depth(options.max_depth);
    for page in &options.pages {
        match build_page(&expander, page, &output, &articles) {
            Ok(target) => {
                info!("Processed {}", page.display());
                report.written.push(target);
            }
            Err(error) if options.keep_going => {
                warn!("Skipping {}: {}", page.display(), error);
                report.failures.push(PageFailure {
                    page: page.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(report)
}

/// Expand one page, embed its articles, and write it under `output`.
/// Returns the written path.
pub fn build_page(
    expander: &Expander,
    page: &Path,
    output: &Path,
    articles: &ContentIndex,
) -> Result<PathBuf, ExpandError> {
    let relative = site_relative(page)?;
    let source = expander.root().join(&relative);
    if !source.is_file() {
        return Err(ExpandError::MissingFile {
            path: source,
            referenced_by: "the page list".into(),
        });
    }

    let is_descriptor = relative
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let (markup, target) = if is_descriptor {
        let text = fs::read_to_string(&source).map_err(|e| io_error(&source, e))?;
        let descriptor: PageDescriptor =
            serde_json::from_str(&text).map_err(|e| ExpandError::MalformedInput {
                path: source.clone(),
                source: e,
            })?;
        debug!("{} renders '{}'", relative.display(), descriptor.template);
        let scope = Scope::from_json(descriptor.config);
        let template = descriptor.template.trim();
        let referenced_by = stitch::Origin::File(relative.clone());
        let full = expander.root().join(template);
        if !full.is_file() {
            return Err(ExpandError::MissingFile {
                path: full,
                referenced_by: referenced_by.to_string(),
            });
        }
        let markup = expander.parse(template, &scope, true)?;
        (markup, output.join(relative.with_extension("html")))
    } else {
        let markup = expander.parse(&relative.to_string_lossy(), &Scope::new(), true)?;
        (markup, output.join(&relative))
    };

    let markup = articles.embed(&markup, &stitch::Origin::File(relative))?;
    write_atomic(&target, &markup)?;
    Ok(target)
}

/// Copy a file or directory tree to the same relative path under `output`.
fn copy_dependency(root: &Path, relative: &Path, output: &Path) -> Result<usize, ExpandError> {
    let source = root.join(relative);
    if !source.exists() {
        return Err(ExpandError::MissingFile {
            path: source,
            referenced_by: "the dependency list".into(),
        });
    }

    let mut copied = 0;
    let walker = WalkDir::new(&source)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(output));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source.clone());
            io_error(&path, e.into())
        })?;
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let target = output.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| io_error(entry.path(), e))?;
            debug!("copied {}", rel.display());
            copied += 1;
        }
    }
    info!("Copied {} ({} file(s))", relative.display(), copied);
    Ok(copied)
}

/// Write through a temporary file in the target directory so readers never
/// observe a half-written page.
fn write_atomic(target: &Path, contents: &str) -> Result<(), ExpandError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| io_error(target, e))?;
    file.persist(target).map_err(|e| io_error(target, e.error))?;
    Ok(())
}

/// Normalize a page or dependency path, rejecting anything outside the
/// site root.
fn site_relative(path: &Path) -> Result<PathBuf, ExpandError> {
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(ExpandError::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "paths may not leave the site root",
                });
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ExpandError::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "paths must be relative to the site root",
                });
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(ExpandError::InvalidPath {
            path: path.to_path_buf(),
            reason: "empty path",
        });
    }
    Ok(relative)
}

fn io_error(path: &Path, source: std::io::Error) -> ExpandError {
    ExpandError::Io {
        path: path.to_path_buf(),
        source,
    }
}
