//! Compiler invoker
//!
//! Owns the job description and the output directory, and drives the
//! bundling engine either once (batch) or for as long as the process lives
//! (watch). A watch run settles on its initial compile; later attempts are
//! drained from a [`WatchSession`].

mod job;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use tracing::{debug, info, warn};

use crate::cli::BuildOptions;
use crate::config::ProjectConfig;
use crate::engine::{self, BundlingEngine, WatchSubscription};
use crate::error::{MakeError, Result};
use crate::pipeline::default_rules;
use crate::plugins::{default_plugins, progress_for};
use crate::reporter::{log_failure, Reporter};
use crate::utils::{empty_dir, format_duration};

pub use job::{JobDescription, Mode, OutputSettings, ResolveSettings, WatchOptions};

/// Submits one job to a bundling engine
pub struct Compiler {
    job: Arc<JobDescription>,
    engine: Arc<dyn BundlingEngine>,
}

impl Compiler {
    /// Build the rule table and job for `options`
    pub fn new(
        options: &BuildOptions,
        config: &ProjectConfig,
        engine: Arc<dyn BundlingEngine>,
    ) -> Result<Self> {
        let rules = default_rules(options, config)?;
        let job = JobDescription::new(options, config, rules, default_plugins(config));

        debug!(
            "Job for {} in {} mode with {} rules",
            engine.name(),
            options.mode(),
            job.rules.len()
        );

        Ok(Self {
            job: Arc::new(job),
            engine,
        })
    }

    pub fn job(&self) -> &JobDescription {
        &self.job
    }

    /// Create the output directory if missing and make sure it is empty
    pub fn prepare_output_dir(&self) -> Result<()> {
        let out_dir = &self.job.output.path;
        info!("Create output folder if missing and make sure it is empty");

        empty_dir(out_dir).map_err(|e| MakeError::fs(out_dir, e))
    }

    /// Compile once and print the summary to stdout
    pub async fn run(&self) -> Result<()> {
        self.run_with(&mut Reporter::stdout()).await
    }

    pub async fn run_with<W: Write>(&self, reporter: &mut Reporter<W>) -> Result<()> {
        self.prepare_output_dir()?;

        info!("Start compilation...");
        let start = Instant::now();

        let spinner = progress_for(&self.job.plugins, self.engine.name());

        let attempt = self.engine.compile(&self.job).await;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        reporter.report(attempt)?;

        eprintln!(
            "\n{} Compiled in {}\n",
            "✓".green().bold(),
            format_duration(start.elapsed())
        );

        Ok(())
    }

    /// Compile now and keep watching for source changes.
    ///
    /// Returns once the initial compile has been reported; the session keeps
    /// the watcher alive.
    pub async fn watch(&self) -> Result<Watching<io::Stdout>> {
        self.watch_with(Reporter::stdout()).await
    }

    pub async fn watch_with<W: Write>(&self, reporter: Reporter<W>) -> Result<Watching<W>> {
        self.prepare_output_dir()?;

        info!("Start watcher...");
        let subscription = engine::subscribe(self.engine.clone(), self.job.clone())
            .map_err(MakeError::Watch)?;

        eprintln!(
            "  {} Watching for changes, press {} to stop\n",
            "•".dimmed(),
            "Ctrl+C".yellow()
        );

        let mut session = WatchSession {
            subscription,
            reporter,
        };
        let initial = match session.next().await {
            Some(result) => result,
            None => {
                warn!("Watcher stopped before the first compile");
                Ok(())
            }
        };

        Ok(Watching { initial, session })
    }
}

/// A watch run after its initial compile
pub struct Watching<W> {
    /// How the initial compile settled
    pub initial: Result<()>,
    pub session: WatchSession<W>,
}

/// Reports the attempts of a live watcher
pub struct WatchSession<W> {
    subscription: WatchSubscription,
    reporter: Reporter<W>,
}

impl<W: Write> WatchSession<W> {
    /// Report the next attempt; `None` once the watcher has stopped
    pub async fn next(&mut self) -> Option<Result<()>> {
        let attempt = self.subscription.next().await?;
        Some(self.reporter.report(attempt))
    }

    /// Report attempts until the watcher stops.
    ///
    /// A failed rebuild ends that attempt only.
    pub async fn follow(mut self) {
        while let Some(result) = self.next().await {
            match result {
                Ok(()) => eprintln!("{} Rebuilt", "✓".green().bold()),
                Err(e) => log_failure(&e),
            }
        }

        warn!("Watcher stopped");
    }

    pub fn reporter(&self) -> &Reporter<W> {
        &self.reporter
    }
}
