//! Sitemake - asset pipeline build orchestrator
//!
//! Resolves command-line flags, builds the pipeline rule table and hands a
//! single job to an external bundling engine, either once or in watch mode.
//! In watch mode the process logs `FINISHED` after the initial compile and
//! stays resident, reporting every rebuild.

use std::process::ExitCode;

use sitemake::reporter::log_failure;
use sitemake::{Cli, Invocation, MakeError, Settled};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sitemake=debug")
    } else {
        EnvFilter::new("sitemake=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run(cli: &Cli) -> Settled {
    match std::env::current_dir() {
        Ok(root) => cli.execute(&root).await,
        Err(e) => Settled::finished(Err(MakeError::fs(".", e))),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let settled = match Cli::from_tokens(std::env::args_os()) {
        Ok(Invocation::Info(help)) => help.exit(),
        Ok(Invocation::Build(cli)) => {
            init_tracing(cli.verbose);
            run(&cli).await
        }
        Err(e) => {
            init_tracing(false);
            Settled::finished(Err(e))
        }
    };

    let code = match &settled.outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_failure(e);
            ExitCode::from(e.exit_code())
        }
    };

    info!("FINISHED");

    if let Some(session) = settled.session {
        session.follow().await;
    }
    code
}
