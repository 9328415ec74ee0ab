//! Bundling engine seam
//!
//! The engine is a black box that takes a [`JobDescription`] and reports
//! [`Stats`]. Module graph work, chunking and asset emission all happen on
//! the other side of [`BundlingEngine::compile`].

mod command;
pub mod watch;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compiler::JobDescription;
use crate::utils::{format_duration, format_size};

pub use command::CommandEngine;
pub use watch::{subscribe, WatchSubscription};

/// One compilation attempt as seen by the reporter
pub type Attempt = Result<Stats, EngineError>;

/// Errors raised while invoking the engine, as opposed to compile errors
/// the engine reports inside [`Stats`]
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },

    #[error("engine produced unreadable stats: {0}")]
    MalformedStats(#[source] serde_json::Error),

    #[error("failed to serialize job: {0}")]
    Job(#[source] serde_json::Error),

    #[error("file watcher failed: {0}")]
    Watcher(#[from] notify::Error),

    #[error("invalid watch ignore pattern: {0}")]
    IgnorePattern(#[from] globset::Error),
}

/// An external bundler driven through a job description
#[async_trait]
pub trait BundlingEngine: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &str;

    /// Run one compilation of `job`
    async fn compile(&self, job: &JobDescription) -> Attempt;
}

/// A diagnostic reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileMessage {
    pub message: String,

    /// Module the diagnostic belongs to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl CompileMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            module: None,
        }
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }
}

impl fmt::Display for CompileMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}: {}", module, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// An emitted output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// The engine's report on a finished compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    #[serde(default)]
    pub assets: Vec<AssetInfo>,

    #[serde(default)]
    pub errors: Vec<CompileMessage>,

    #[serde(default)]
    pub warnings: Vec<CompileMessage>,

    /// Pre-rendered summary; replaces the generated one when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Stats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(summary) = &self.summary {
            return f.write_str(summary.trim_end());
        }

        let mut header = Vec::new();
        if let Some(hash) = &self.hash {
            header.push(format!("Hash: {}", hash));
        }
        if let Some(ms) = self.duration_ms {
            header.push(format!("Time: {}", format_duration(Duration::from_millis(ms))));
        }
        if !header.is_empty() {
            writeln!(f, "{}", header.join("  "))?;
        }

        let width = self.assets.iter().map(|a| a.name.len()).max().unwrap_or(0);
        for asset in &self.assets {
            writeln!(f, "  {:width$}  {}", asset.name, format_size(asset.size), width = width)?;
        }

        for warning in &self.warnings {
            writeln!(f, "WARNING in {}", warning)?;
        }
        for error in &self.errors {
            writeln!(f, "ERROR in {}", error)?;
        }

        write!(
            f,
            "{} asset(s), {} warning(s), {} error(s)",
            self.assets.len(),
            self.warnings.len(),
            self.errors.len()
        )
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Engine stand-in that replays a fixed result and records what it saw
    pub struct ScriptedEngine {
        stats: Stats,
        fatal: Option<String>,
        calls: AtomicUsize,
        out_dir_entries: Mutex<Vec<usize>>,
    }

    impl ScriptedEngine {
        pub fn succeeding(stats: Stats) -> Self {
            Self {
                stats,
                fatal: None,
                calls: AtomicUsize::new(0),
                out_dir_entries: Mutex::new(Vec::new()),
            }
        }

        pub fn crashing(stderr: &str) -> Self {
            Self {
                fatal: Some(stderr.to_string()),
                ..Self::succeeding(Stats::default())
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Number of entries in the output directory at each compile
        pub fn out_dir_entries(&self) -> Vec<usize> {
            self.out_dir_entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BundlingEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn compile(&self, job: &JobDescription) -> Attempt {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let out: &PathBuf = &job.output.path;
            let entries = std::fs::read_dir(out).map(|d| d.count()).unwrap_or(usize::MAX);
            self.out_dir_entries.lock().unwrap().push(entries);

            match &self.fatal {
                Some(stderr) => Err(EngineError::Exited {
                    status: "exit status: 1".to_string(),
                    stderr: stderr.clone(),
                }),
                None => Ok(self.stats.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_summary_lists_assets() {
        let stats = Stats {
            hash: Some("4f2a9c".to_string()),
            duration_ms: Some(1500),
            assets: vec![
                AssetInfo { name: "bundle.js".to_string(), size: 2048 },
                AssetInfo { name: "index.html".to_string(), size: 512 },
            ],
            warnings: vec![CompileMessage::new("unused export").in_module("./src/util.ts")],
            ..Stats::default()
        };

        let summary = stats.to_string();
        assert!(summary.starts_with("Hash: 4f2a9c  Time: 1.50s"));
        assert!(summary.contains("bundle.js   2.00 KB"));
        assert!(summary.contains("WARNING in ./src/util.ts: unused export"));
        assert!(summary.ends_with("2 asset(s), 1 warning(s), 0 error(s)"));
    }

    #[test]
    fn test_engine_summary_takes_precedence() {
        let stats = Stats {
            summary: Some("compiled successfully\n".to_string()),
            assets: vec![AssetInfo { name: "bundle.js".to_string(), size: 1 }],
            ..Stats::default()
        };
        assert_eq!(stats.to_string(), "compiled successfully");
    }

    #[test]
    fn test_stats_deserialize_with_missing_fields() {
        let stats: Stats =
            serde_json::from_str(r#"{"errors":[{"message":"Unexpected token","module":"./src/index.ts"}]}"#)
                .unwrap();

        assert!(stats.has_errors());
        assert!(!stats.has_warnings());
        assert_eq!(stats.errors[0].to_string(), "./src/index.ts: Unexpected token");
    }
}
