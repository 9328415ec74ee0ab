//! Engine backed by an external bundler process

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::compiler::JobDescription;
use crate::config::EngineConfig;

use super::{Attempt, BundlingEngine, EngineError, Stats};

/// Runs `program args...` in the project root for each compilation.
///
/// The job is written to the child's stdin as JSON and the child answers
/// with a JSON [`Stats`] object on stdout. A non-zero exit is still a
/// normal compilation result as long as stdout parses as stats.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl CommandEngine {
    pub fn new(root: &Path, config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            cwd: root.to_path_buf(),
        }
    }
}

#[async_trait]
impl BundlingEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    async fn compile(&self, job: &JobDescription) -> Attempt {
        let payload = serde_json::to_vec(job).map_err(EngineError::Job)?;

        debug!("Invoking {} {:?} in {}", self.program, self.args, self.cwd.display());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin while the child's output is drained so neither side blocks
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&payload).await {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            debug!("{} stderr:\n{}", self.program, stderr);
        }

        match serde_json::from_slice::<Stats>(&output.stdout) {
            Ok(stats) => Ok(stats),
            Err(e) if output.status.success() => Err(EngineError::MalformedStats(e)),
            Err(_) => Err(EngineError::Exited {
                status: output.status.to_string(),
                stderr,
            }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::BuildOptions;
    use crate::config::ProjectConfig;
    use crate::pipeline::default_rules;
    use crate::plugins::default_plugins;

    fn job(root: &Path) -> JobDescription {
        let options = BuildOptions {
            root: root.to_path_buf(),
            entry: root.join("src/index.ts"),
            out_dir: root.join("public"),
            production: false,
            watch: false,
        };
        let config = ProjectConfig::default();
        let rules = default_rules(&options, &config).unwrap();
        JobDescription::new(&options, &config, rules, default_plugins(&config))
    }

    fn shell(script: &str) -> EngineConfig {
        EngineConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[tokio::test]
    async fn test_stats_are_read_from_stdout() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new(
            tmp.path(),
            &shell(r#"cat > /dev/null; echo '{"assets":[{"name":"bundle.js","size":10}]}'"#),
        );

        let stats = engine.compile(&job(tmp.path())).await.unwrap();
        assert_eq!(stats.assets.len(), 1);
        assert!(!stats.has_errors());
    }

    #[tokio::test]
    async fn test_job_is_piped_to_stdin() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new(
            tmp.path(),
            &shell(r#"cat > job.json; echo '{}'"#),
        );

        engine.compile(&job(tmp.path())).await.unwrap();

        let written = std::fs::read_to_string(tmp.path().join("job.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["mode"], "development");
        assert_eq!(value["devtool"], "source-map");
    }

    #[tokio::test]
    async fn test_failed_exit_with_stats_is_a_compile_result() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new(
            tmp.path(),
            &shell(r#"cat > /dev/null; echo '{"errors":[{"message":"boom"}]}'; exit 1"#),
        );

        let stats = engine.compile(&job(tmp.path())).await.unwrap();
        assert_eq!(stats.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_exit_without_stats_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new(tmp.path(), &shell("echo 'cannot find module' >&2; exit 3"));

        let err = engine.compile(&job(tmp.path())).await.unwrap_err();
        match err {
            EngineError::Exited { stderr, .. } => assert_eq!(stderr, "cannot find module"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_on_success_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new(tmp.path(), &shell("echo 'done!'"));

        let err = engine.compile(&job(tmp.path())).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedStats(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CommandEngine::new(
            tmp.path(),
            &EngineConfig {
                program: "sitemake-engine-missing-for-tests".to_string(),
                args: Vec::new(),
            },
        );

        let err = engine.compile(&job(tmp.path())).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }
}
