use crate::error::{ErrorStage, GradeError, Result};
use crate::process::{run_process, Capture};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Container engine collaborator: build, run and remove tagged images.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Build `context_dir` into `tag`. Engine output is discarded.
    async fn build(&self, context_dir: &Path, tag: &str, timeout: Duration) -> Result<()>;
    /// Run `command` through a shell in a throwaway container, returning stdout and stderr.
    async fn run(&self, tag: &str, command: &str, timeout: Duration) -> Result<String>;
    async fn remove_image(&self, tag: &str) -> Result<()>;
}

/// Name of the verification container started from `tag`.
pub fn check_container_name(tag: &str) -> String {
    format!("{}-check", tag)
}

/// `docker` on the PATH.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

impl DockerCli {
    /// Use a docker-compatible CLI such as `podman`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Killing the client on timeout leaves the container running; remove it by name.
    async fn remove_container(&self, name: &str) {
        match run_process(
            &self.program,
            &["rm", "-f", name],
            Capture::Piped,
            None,
            ErrorStage::Cleanup,
        )
        .await
        {
            Ok(output) if output.success => {
                tracing::debug!(container = name, "stuck container removed")
            }
            Ok(output) => {
                tracing::warn!(container = name, stderr = %output.stderr.trim(), "container removal failed")
            }
            Err(e) => tracing::warn!(container = name, error = %e, "container removal failed"),
        }
    }
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn build(&self, context_dir: &Path, tag: &str, timeout: Duration) -> Result<()> {
        let context = context_dir.to_string_lossy();
        let output = run_process(
            &self.program,
            &["build", "-t", tag, context.as_ref()],
            Capture::Discard,
            Some(timeout),
            ErrorStage::Build,
        )
        .await
        .map_err(|e| match e {
            GradeError::Timeout { secs, .. } => GradeError::BuildTimeout {
                tag: tag.to_string(),
                secs,
            },
            other => other,
        })?;

        if !output.success {
            return Err(GradeError::BuildFailure {
                tag: tag.to_string(),
                code: output.code,
            });
        }
        Ok(())
    }

    async fn run(&self, tag: &str, command: &str, timeout: Duration) -> Result<String> {
        let name = check_container_name(tag);
        let result = run_process(
            &self.program,
            &["run", "--rm", "--name", name.as_str(), tag, "bash", "-c", command],
            Capture::Piped,
            Some(timeout),
            ErrorStage::Verify,
        )
        .await;

        match result {
            Ok(output) => Ok(output.combined()),
            Err(e @ GradeError::Timeout { .. }) => {
                self.remove_container(&name).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn remove_image(&self, tag: &str) -> Result<()> {
        let output = run_process(
            &self.program,
            &["rmi", "-f", tag],
            Capture::Piped,
            None,
            ErrorStage::Cleanup,
        )
        .await?;

        if output.success || output.stderr.contains("No such image") {
            return Ok(());
        }
        Err(GradeError::Cleanup {
            tag: tag.to_string(),
            reason: output.stderr.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_engine_binary_fails_build() {
        let engine = DockerCli::with_program("no-such-container-engine-7731");
        let err = engine
            .build(Path::new("."), "pyenv-grader-x", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Spawn { .. }));
        assert_eq!(err.stage(), ErrorStage::Build);
    }

    #[tokio::test]
    async fn test_missing_engine_binary_fails_removal() {
        let engine = DockerCli::with_program("no-such-container-engine-7731");
        let err = engine.remove_image("pyenv-grader-x").await.unwrap_err();
        assert_eq!(err.stage(), ErrorStage::Cleanup);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_timeout_removes_named_container() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let calls = tmp.path().join("calls.log");
        let script = tmp.path().join("fake-docker");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\nif [ \"$1\" = run ]; then exec sleep 10; fi\nexit 0\n",
                calls.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let engine = DockerCli::with_program(script.to_string_lossy());
        let err = engine
            .run("pyenv-grader-kim", "pyenv -v", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Timeout { .. }));
        assert_eq!(err.stage(), ErrorStage::Verify);

        let log = fs::read_to_string(&calls).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("run --rm --name pyenv-grader-kim-check pyenv-grader-kim bash -c"));
        assert_eq!(lines[1], "rm -f pyenv-grader-kim-check");
    }
}
