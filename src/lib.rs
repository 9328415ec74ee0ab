//! Sitemake library
//!
//! Core functionality for the Sitemake build orchestrator: argument
//! resolution, the pipeline rule table, the bundling engine seam, the
//! compiler invoker and result reporting.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod plugins;
pub mod reporter;
pub mod utils;

pub use cli::{BuildOptions, Cli, Invocation, Settled};
pub use compiler::{Compiler, JobDescription, WatchSession, Watching};
pub use config::ProjectConfig;
pub use engine::{BundlingEngine, CommandEngine, Stats};
pub use error::{MakeError, Result};
pub use pipeline::{PipelineRule, RuleTable, TransformStep};
pub use reporter::{BuildOutcome, Reporter};
