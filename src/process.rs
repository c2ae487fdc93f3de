//! Blocking-style invocation of collaborator processes with optional timeouts.

use crate::error::{ErrorStage, GradeError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Whether the child's output is kept or discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Piped,
    Discard,
}

/// Run `program args..` to completion.
///
/// When `timeout` elapses the child is killed and `GradeError::Timeout` is returned.
/// Launch and timeout errors are tagged with `stage`.
pub async fn run_process(
    program: &str,
    args: &[&str],
    capture: Capture,
    timeout: Option<Duration>,
    stage: ErrorStage,
) -> Result<ProcessOutput> {
    let (stdout, stderr) = match capture {
        Capture::Piped => (Stdio::piped(), Stdio::piped()),
        Capture::Discard => (Stdio::null(), Stdio::null()),
    };

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| GradeError::Spawn {
            program: program.to_string(),
            stage,
            source,
        })?;

    let waited = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| GradeError::Timeout {
                program: program.to_string(),
                secs: limit.as_secs(),
                stage,
            })?,
        None => child.wait_with_output().await,
    };

    let output = waited.map_err(|source| GradeError::Spawn {
        program: program.to_string(),
        stage,
        source,
    })?;

    Ok(ProcessOutput {
        code: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_joins_streams() {
        let output = ProcessOutput {
            code: Some(0),
            success: true,
            stdout: "pyenv 2.4.1".to_string(),
            stderr: "Python 3.12.3\n".to_string(),
        };
        assert_eq!(output.combined(), "pyenv 2.4.1\nPython 3.12.3\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_process(
            "definitely-not-a-real-binary-4821",
            &[],
            Capture::Piped,
            None,
            ErrorStage::Verify,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GradeError::Spawn { .. }));
        assert_eq!(err.stage(), ErrorStage::Verify);
    }
}
