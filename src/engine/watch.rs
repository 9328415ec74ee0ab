//! Watch mode for automatic rebuilds on file changes
//!
//! A watcher thread owns the debouncer and forwards relevant changes to a
//! tokio task. That task runs compilations one at a time and publishes each
//! attempt on an unbounded channel, starting with an initial compile.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::compiler::{JobDescription, WatchOptions};
use crate::plugins::progress_for;

use super::{Attempt, BundlingEngine, EngineError};

/// Receiving end of a watch session
pub struct WatchSubscription {
    events: mpsc::UnboundedReceiver<Attempt>,
}

impl WatchSubscription {
    /// Next compilation attempt; `None` once the watcher has stopped
    pub async fn next(&mut self) -> Option<Attempt> {
        self.events.recv().await
    }
}

/// Decides which file system events trigger a rebuild
#[derive(Debug)]
pub struct ChangeFilter {
    out_dir: PathBuf,
    ignored: GlobSet,
}

impl ChangeFilter {
    pub fn new(out_dir: &Path, options: &WatchOptions) -> Result<Self, EngineError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &options.ignored {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            ignored: builder.build()?,
        })
    }

    /// Changes to emitted output never count, or a build would trigger itself
    pub fn is_relevant(&self, path: &Path) -> bool {
        !path.starts_with(&self.out_dir) && !self.ignored.is_match(path)
    }
}

/// Start watching and compiling `job`.
///
/// Must be called inside a tokio runtime. The first attempt on the
/// subscription is the initial compile; every later one follows a debounced
/// batch of relevant changes.
pub fn subscribe(
    engine: Arc<dyn BundlingEngine>,
    job: Arc<JobDescription>,
) -> Result<WatchSubscription, EngineError> {
    let options = &job.watch_options;
    let filter = ChangeFilter::new(&job.output.path, options)?;

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(options.debounce_ms), tx)?;
    for path in &options.paths {
        debug!("Watching {}", path.display());
        debouncer.watcher().watch(path, RecursiveMode::Recursive)?;
    }

    let (change_tx, mut change_rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Attempt>();

    std::thread::spawn(move || {
        // Keep debouncer alive for the duration of the watcher
        let _debouncer = debouncer;

        loop {
            match rx.recv() {
                Ok(Ok(events)) => {
                    let changed: Vec<PathBuf> = events
                        .into_iter()
                        .map(|event| event.path)
                        .filter(|path| filter.is_relevant(path))
                        .collect();

                    if !changed.is_empty() && change_tx.send(changed).is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    error!("Watch error: {:?}", e);
                }
                Err(_) => break,
            }
        }
    });

    tokio::spawn(async move {
        if event_tx.send(compile(engine.as_ref(), &job).await).is_err() {
            return;
        }

        while let Some(mut changed) = change_rx.recv().await {
            // Fold changes that piled up during the previous compile
            while let Ok(more) = change_rx.try_recv() {
                changed.extend(more);
            }
            changed.sort();
            changed.dedup();

            for path in &changed {
                eprintln!(
                    "  {} File changed: {}",
                    "↻".yellow(),
                    path.display().to_string().dimmed()
                );
            }
            info!("Recompiling with {}...", engine.name());

            if event_tx.send(compile(engine.as_ref(), &job).await).is_err() {
                break;
            }
        }
    });

    Ok(WatchSubscription { events: event_rx })
}

async fn compile(engine: &dyn BundlingEngine, job: &JobDescription) -> Attempt {
    let spinner = progress_for(&job.plugins, engine.name());
    let attempt = engine.compile(job).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    attempt
}
