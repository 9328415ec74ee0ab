//! Plugins attached to a job
//!
//! Plugins are declarative: the engine applies them, except for
//! [`PluginSpec::Progress`], which is honored here by showing a spinner
//! while a compile is running, in batch and watch mode alike.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::config::ProjectConfig;

/// A plugin entry in the job description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Report compile progress on the console
    Progress,
    /// Never pull resources matching `resource_pattern` into the graph
    Ignore { resource_pattern: String },
}

/// Stock plugin set.
///
/// The bundle itself is ignored as an import so a page that references the
/// emitted script does not drag a stale copy back into the build.
pub fn default_plugins(config: &ProjectConfig) -> Vec<PluginSpec> {
    vec![
        PluginSpec::Progress,
        PluginSpec::Ignore {
            resource_pattern: format!("(?i){}$", regex::escape(&config.output.filename)),
        },
    ]
}

/// Spinner for one compile, when the plugin set asks for progress
pub fn progress_for(plugins: &[PluginSpec], engine: &str) -> Option<ProgressBar> {
    if !plugins.contains(&PluginSpec::Progress) {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Compiling with {}", engine));
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}
