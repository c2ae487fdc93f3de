use crate::error::{ErrorStage, GradeError, Result};
use crate::process::{run_process, Capture};
use crate::workspace::Workspace;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Exit status and error text of a clone attempt.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub success: bool,
    pub stderr: String,
}

/// Version-control collaborator.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<CloneOutcome>;
}

/// `git` on the PATH.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    pub timeout: Option<Duration>,
}

impl GitCli {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<CloneOutcome> {
        let dest = dest.to_string_lossy();
        let output = run_process(
            "git",
            &["clone", url, dest.as_ref()],
            Capture::Piped,
            self.timeout,
            ErrorStage::Clone,
        )
        .await?;

        Ok(CloneOutcome {
            success: output.success,
            stderr: output.stderr,
        })
    }
}

/// Clone `url` into the workspace and confirm `script_rel` exists in the checkout.
///
/// Returns the absolute path of the script inside the clone.
pub async fn fetch_repository(
    vcs: &dyn VersionControl,
    url: &str,
    workspace: &Workspace,
    script_rel: &str,
) -> Result<PathBuf> {
    let repo_dir = workspace.repo_dir();
    let outcome = vcs.clone_repo(url, &repo_dir).await?;

    if !outcome.success {
        return Err(GradeError::CloneFailure {
            stderr: outcome.stderr.trim().to_string(),
        });
    }

    let script = repo_dir.join(script_rel);
    if !script.exists() {
        return Err(GradeError::ScriptNotFound { path: script });
    }

    tracing::debug!(url, script = %script.display(), "repository fetched");
    Ok(script)
}
