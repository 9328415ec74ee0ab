//! Declarative job handed to the bundling engine

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::cli::BuildOptions;
use crate::config::ProjectConfig;
use crate::pipeline::RuleTable;
use crate::plugins::PluginSpec;

/// Build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

/// Where and how output is written
#[derive(Debug, Clone, Serialize)]
pub struct OutputSettings {
    pub path: PathBuf,
    pub filename: String,
    pub public_path: String,
}

/// Module resolution settings
#[derive(Debug, Clone, Serialize)]
pub struct ResolveSettings {
    pub extensions: Vec<String>,
    pub modules: Vec<String>,
}

/// What the watcher observes
#[derive(Debug, Clone, Serialize)]
pub struct WatchOptions {
    pub paths: Vec<PathBuf>,
    pub ignored: Vec<String>,
    pub debounce_ms: u64,
}

/// Everything the engine needs for one run.
///
/// Built once per run and shared read-only after that.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescription {
    pub mode: Mode,
    /// `source-map` in development, absent in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devtool: Option<String>,
    pub context: PathBuf,
    pub entry: PathBuf,
    pub target: String,
    pub output: OutputSettings,
    pub resolve: ResolveSettings,
    pub externals: BTreeMap<String, String>,
    pub rules: RuleTable,
    pub plugins: Vec<PluginSpec>,
    pub watch: bool,
    pub watch_options: WatchOptions,
}

impl JobDescription {
    pub fn new(
        options: &BuildOptions,
        config: &ProjectConfig,
        rules: RuleTable,
        plugins: Vec<PluginSpec>,
    ) -> Self {
        let mode = if options.production {
            Mode::Production
        } else {
            Mode::Development
        };

        // Sources live next to the entry point
        let watch_root = options
            .entry
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| options.root.clone());

        Self {
            mode,
            devtool: (mode == Mode::Development).then(|| "source-map".to_string()),
            context: options.root.clone(),
            entry: options.entry.clone(),
            target: config.output.target.clone(),
            output: OutputSettings {
                path: options.out_dir.clone(),
                filename: config.output.filename.clone(),
                public_path: config.output.public_path.clone(),
            },
            resolve: ResolveSettings {
                extensions: config.resolve.extensions.clone(),
                modules: config.resolve.modules.clone(),
            },
            externals: config.resolve.externals.clone(),
            rules,
            plugins,
            watch: options.watch,
            watch_options: WatchOptions {
                paths: vec![watch_root],
                ignored: config.watch.ignored.clone(),
                debounce_ms: config.watch.debounce_ms,
            },
        }
    }
}
