//! Project configuration
//!
//! Reads the optional `sitemake.toml` at the project root. Every section and
//! key has a default, so a project without the file builds with the stock
//! layout.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MakeError, Result};

pub use schema::*;

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE: &str = "sitemake.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Source layout
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Module resolution
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Bundling engine invocation
    #[serde(default)]
    pub engine: EngineConfig,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl ProjectConfig {
    /// Load `sitemake.toml` from `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);

        if !path.exists() {
            debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| MakeError::InvalidConfig {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let config = Self::parse(&content).map_err(|reason| MakeError::InvalidConfig {
            path: path.clone(),
            reason,
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: ProjectConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.layout.entry_markup.trim().is_empty() {
            return Err("layout.entry_markup must not be empty".to_string());
        }
        let is_pug = Path::new(&self.layout.entry_markup)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pug"));
        if !is_pug {
            return Err(format!(
                "layout.entry_markup must be a .pug template, got '{}'",
                self.layout.entry_markup
            ));
        }
        if self.output.filename.trim().is_empty() {
            return Err("output.filename must not be empty".to_string());
        }
        if self.engine.program.trim().is_empty() {
            return Err("engine.program must not be empty".to_string());
        }
        Ok(())
    }

    /// Absolute path of the entry markup template
    pub fn entry_markup_path(&self, root: &Path) -> PathBuf {
        crate::utils::resolve_path(root, Path::new(&self.layout.entry_markup))
    }

    /// Absolute path of the main stylesheet, when one is configured
    pub fn main_stylesheet_path(&self, root: &Path) -> Option<PathBuf> {
        self.layout
            .main_stylesheet
            .as_ref()
            .map(|p| crate::utils::resolve_path(root, Path::new(p)))
    }
}
