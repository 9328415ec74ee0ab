//! Result reporting
//!
//! Turns a compilation attempt into a [`BuildOutcome`], prints the stats
//! summary of a clean compile and fails otherwise.

use std::io::{self, Write};

use tracing::{error, warn};

use crate::engine::{Attempt, CompileMessage, Stats};
use crate::error::{MakeError, Result};

/// Settled result of one compilation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Success(Stats),
    Failure {
        primary: String,
        further: Vec<CompileMessage>,
    },
}

impl BuildOutcome {
    pub fn from_attempt(attempt: Attempt) -> Self {
        match attempt {
            Err(fatal) => BuildOutcome::Failure {
                primary: fatal.to_string(),
                further: Vec::new(),
            },
            Ok(stats) if stats.has_errors() => BuildOutcome::Failure {
                primary: format!(
                    "bundling engine reported {} error(s)",
                    stats.errors.len()
                ),
                further: stats.errors,
            },
            Ok(stats) => BuildOutcome::Success(stats),
        }
    }

    pub fn into_result(self) -> Result<Stats> {
        match self {
            BuildOutcome::Success(stats) => Ok(stats),
            BuildOutcome::Failure { primary, further } => {
                Err(MakeError::CompilationFailed { primary, further })
            }
        }
    }
}

/// Writes stats summaries for successful compiles
pub struct Reporter<W> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Settle one attempt. Nothing is written when it failed, and a summary
    /// that cannot be written fails the attempt.
    pub fn report(&mut self, attempt: Attempt) -> Result<()> {
        let stats = BuildOutcome::from_attempt(attempt).into_result()?;

        if stats.has_warnings() {
            warn!("Compiled with {} warning(s)", stats.warnings.len());
        }

        writeln!(self.out, "{}", stats)
            .and_then(|_| self.out.flush())
            .map_err(MakeError::Output)
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Log an error and every sub-error it carries
pub fn log_failure(err: &MakeError) {
    error!("{}", err);
    for (i, sub) in err.further().iter().enumerate() {
        error!("  [{}] {}", i + 1, sub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AssetInfo, EngineError};
    use pretty_assertions::assert_eq;

    fn report(attempt: Attempt) -> (Result<()>, String) {
        let mut reporter = Reporter::new(Vec::new());
        let result = reporter.report(attempt);
        (result, String::from_utf8(reporter.into_inner()).unwrap())
    }

    #[test]
    fn test_clean_compile_prints_summary() {
        let stats = Stats {
            assets: vec![AssetInfo { name: "bundle.js".to_string(), size: 100 }],
            ..Stats::default()
        };

        let (result, out) = report(Ok(stats.clone()));

        assert!(result.is_ok());
        assert_eq!(out, format!("{}\n", stats));
    }

    #[test]
    fn test_reported_errors_fail_with_exact_list() {
        let errors = vec![
            CompileMessage::new("Cannot find module './missing'").in_module("./src/index.ts"),
            CompileMessage::new("Expected ';'").in_module("./src/view.tsx"),
        ];
        let stats = Stats {
            errors: errors.clone(),
            ..Stats::default()
        };

        let (result, out) = report(Ok(stats));

        match result.unwrap_err() {
            MakeError::CompilationFailed { primary, further } => {
                assert_eq!(primary, "bundling engine reported 2 error(s)");
                assert_eq!(further, errors);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_fatal_engine_error_fails_without_sub_errors() {
        let fatal = EngineError::Exited {
            status: "exit status: 127".to_string(),
            stderr: "sh: sitemake-engine: not found".to_string(),
        };

        let (result, out) = report(Err(fatal));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("sitemake-engine: not found"));
        assert!(err.further().is_empty());
        assert!(out.is_empty());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unwritable_summary_fails_the_attempt() {
        let mut reporter = Reporter::new(ClosedPipe);

        let err = reporter.report(Ok(Stats::default())).unwrap_err();

        assert!(matches!(&err, MakeError::Output(e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("stdout closed"));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let stats = Stats {
            warnings: vec![CompileMessage::new("asset size limit exceeded")],
            ..Stats::default()
        };

        let outcome = BuildOutcome::from_attempt(Ok(stats.clone()));
        assert_eq!(outcome, BuildOutcome::Success(stats));
    }
}
