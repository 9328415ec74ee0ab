//! Configuration schema definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source layout of the project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Template rendered into the top-level HTML page
    #[serde(default = "default_entry_markup")]
    pub entry_markup: String,

    /// Restrict the stylesheet rule to a single file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_stylesheet: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            entry_markup: default_entry_markup(),
            main_stylesheet: None,
        }
    }
}

fn default_entry_markup() -> String {
    "src/index.pug".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Script bundle file name
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Public URL prefix for emitted assets
    #[serde(default)]
    pub public_path: String,

    /// Runtime environment the engine compiles for
    #[serde(default = "default_target")]
    pub target: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            public_path: String::new(),
            target: default_target(),
        }
    }
}

fn default_filename() -> String {
    "bundle.js".to_string()
}

fn default_target() -> String {
    "web".to_string()
}

/// Module resolution settings handed to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveConfig {
    /// Extensions tried, in order, for extension-less imports
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directories searched for bare specifiers
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Imports left to the runtime, keyed by request
    #[serde(default = "default_externals")]
    pub externals: BTreeMap<String, String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            modules: default_modules(),
            externals: default_externals(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_string(), ".ts".to_string(), ".tsx".to_string()]
}

fn default_modules() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_externals() -> BTreeMap<String, String> {
    let mut externals = BTreeMap::new();
    externals.insert("./bundle.js".to_string(), "bundle.js".to_string());
    externals
}

/// External bundling engine invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Executable that reads a job on stdin and writes stats on stdout
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments passed before the job is piped in
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

fn default_program() -> String {
    "sitemake-engine".to_string()
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period before a batch of changes triggers a rebuild
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Glob patterns whose changes never trigger a rebuild
    #[serde(default = "default_ignored")]
    pub ignored: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ignored: default_ignored(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_ignored() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()]
}
