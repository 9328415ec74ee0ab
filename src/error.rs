//! Error types surfaced to the top level of a run

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::{CompileMessage, EngineError};
use crate::pipeline::PipelineError;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MakeError>;

/// Every failure a run can end with.
///
/// None of these are retried. In watch mode a `CompilationFailed` ends only
/// the attempt it belongs to, not the watch process.
#[derive(Debug, Error)]
pub enum MakeError {
    /// Bad command-line input; aborts before any build step
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine could not be invoked or reported errors
    #[error("Compilation failed: {primary}")]
    CompilationFailed {
        primary: String,
        further: Vec<CompileMessage>,
    },

    /// The output directory could not be created or cleared
    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `sitemake.toml` could not be read or parsed
    #[error("Invalid configuration in {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    /// The pipeline rule table failed validation
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(#[from] PipelineError),

    /// The stats summary of a clean compile could not be written
    #[error("Failed to write stats summary: {0}")]
    Output(#[source] std::io::Error),

    /// The file watcher could not be started
    #[error("Watch error: {0}")]
    Watch(#[source] EngineError),
}

impl MakeError {
    /// Wrap an I/O error with the path it happened on
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Sub-errors carried by a failed compilation
    pub fn further(&self) -> &[CompileMessage] {
        match self {
            Self::CompilationFailed { further, .. } => further,
            _ => &[],
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}
