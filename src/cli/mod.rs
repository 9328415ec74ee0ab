//! Command-line interface for Sitemake
//!
//! A single flat command: flags pick the entry point, the output directory,
//! production mode and watch mode.

mod options;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use tracing::info;

use crate::compiler::{Compiler, WatchSession, Watching};
use crate::config::ProjectConfig;
use crate::engine::CommandEngine;
use crate::error::{MakeError, Result};

pub use options::BuildOptions;

/// Sitemake - asset pipeline build orchestrator
#[derive(Parser, Debug)]
#[command(name = "sitemake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Compilation entry point
    #[arg(short, long, default_value = "src/index.ts")]
    pub entry: PathBuf,

    /// Output directory (emptied before the build)
    #[arg(short, long, default_value = "public")]
    pub out_dir: PathBuf,

    /// Disable source maps and enable production optimizations
    #[arg(short, long)]
    pub production: bool,

    /// Keep running and recompile on source changes
    #[arg(short, long)]
    pub watch: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the command line asked for
#[derive(Debug)]
pub enum Invocation {
    /// Run a build
    Build(Cli),
    /// Help or version text was requested; print it and stop
    Info(clap::Error),
}

/// How a run settled
pub struct Settled {
    pub outcome: Result<()>,
    /// The live watcher, once a watch run has settled its initial compile
    pub session: Option<WatchSession<io::Stdout>>,
}

impl Settled {
    pub fn finished(outcome: Result<()>) -> Self {
        Self {
            outcome,
            session: None,
        }
    }
}

impl Cli {
    /// Parse raw tokens; the first token is the program name.
    ///
    /// Unknown flags and value flags without a value are `InvalidArgument`.
    pub fn from_tokens<I, T>(tokens: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(tokens) {
            Ok(cli) => Ok(Invocation::Build(cli)),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Ok(Invocation::Info(e))
            }
            Err(e) => Err(MakeError::InvalidArgument(summarize(&e))),
        }
    }

    /// Execute the build against a project root.
    ///
    /// A watch run settles with its initial compile and hands back the live
    /// session.
    pub async fn execute(&self, root: &Path) -> Settled {
        match self.start(root).await {
            Ok(settled) => settled,
            Err(e) => Settled::finished(Err(e)),
        }
    }

    async fn start(&self, root: &Path) -> Result<Settled> {
        print_banner();

        let options = BuildOptions::resolve(self, root);
        info!(
            "Started with options:\n  Entry File: {}\n  Out Dir: {}\n  Prod: {}\n  Watch: {}",
            options.entry.display(),
            options.out_dir.display(),
            options.production,
            options.watch
        );

        let config = ProjectConfig::load(&options.root)?;
        let engine = Arc::new(CommandEngine::new(&options.root, &config.engine));
        let compiler = Compiler::new(&options, &config, engine)?;

        if options.watch {
            let Watching { initial, session } = compiler.watch().await?;
            Ok(Settled {
                outcome: initial,
                session: Some(session),
            })
        } else {
            Ok(Settled::finished(compiler.run().await))
        }
    }
}

/// First line of a clap error without the `error:` prefix
fn summarize(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.trim_start_matches("error:").trim().to_string()
}

/// Print the Sitemake banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚙".cyan(),
        "Sitemake".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
