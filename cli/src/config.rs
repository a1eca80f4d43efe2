use std::path::{Path, PathBuf};

use serde::Deserialize;

use expander::BuildOptions;

/// Name of the site configuration file looked up in the site root.
pub const CONFIG_FILE: &str = "stitch.toml";

/// Contents of `stitch.toml`. Every key is optional; missing keys fall back
/// to the build defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Output directory, relative to the site root.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Pages to build. Defaults to `["index.html"]`.
    #[serde(default)]
    pub pages: Option<Vec<PathBuf>>,

    /// Markdown files embedded into `<article id>` elements.
    #[serde(default)]
    pub content: Option<PathBuf>,

    /// Files and directories copied verbatim into the output.
    #[serde(default)]
    pub dependencies: Option<Vec<PathBuf>>,

    #[serde(default)]
    pub clean: Option<bool>,

    #[serde(default)]
    pub keep_going: Option<bool>,

    /// Maximum template nesting depth.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl SiteConfig {
    /// Build options for `root`, with this file's values over the defaults.
    pub fn into_options(self, root: PathBuf) -> BuildOptions {
        let defaults = BuildOptions::default();
        BuildOptions {
            root,
            output: self.output.unwrap_or(defaults.output),
            dependencies: self.dependencies.unwrap_or(defaults.dependencies),
            pages: self.pages.unwrap_or(defaults.pages),
            content: self.content.unwrap_or(defaults.content),
            clean: self.clean.unwrap_or(defaults.clean),
            keep_going: self.keep_going.unwrap_or(defaults.keep_going),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
        }
    }
}

fn parse_config(text: &str) -> Result<SiteConfig, String> {
    let config: SiteConfig = toml::from_str(text).map_err(|e| format!("invalid TOML: {}", e))?;
    if config.max_depth == Some(0) {
        return Err("max_depth must be at least 1".into());
    }
    Ok(config)
}

/// Load the site configuration.
///
/// An explicit path must exist. Without one, `stitch.toml` in `root` is
/// used when present, and the defaults otherwise.
pub fn load(root: &Path, explicit: Option<&Path>) -> Result<SiteConfig, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = root.join(CONFIG_FILE);
            if !path.is_file() {
                log::debug!("no {} in {}, using defaults", CONFIG_FILE, root.display());
                return Ok(SiteConfig::default());
            }
            path
        }
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    log::debug!("loaded {}", path.display());
    parse_config(&text).map_err(|e| format!("{}: {}", path.display(), e))
}
