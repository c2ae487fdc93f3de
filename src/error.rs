/// Grader error types and handling utilities
use std::path::PathBuf;

/// Main error type for grading operations
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    /// Roster row with the wrong number of fields
    #[error("Malformed roster row {line}: expected 4 fields, got {fields} ({raw})")]
    MalformedRow {
        line: u64,
        fields: usize,
        raw: String,
    },
    /// Workspace directory could not be reset
    #[error("Workspace error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Two submissions in the same batch map onto one identifier
    #[error("Identifier collision: '{name}' sanitizes to '{identifier}', already used by '{previous}'")]
    IdentifierCollision {
        name: String,
        identifier: String,
        previous: String,
    },
    /// Display name has no characters left after sanitizing
    #[error("Name '{name}' has no usable characters for a workspace or image tag")]
    EmptyIdentifier { name: String },
    /// `git clone` exited non-zero
    #[error("git clone failed: {stderr}")]
    CloneFailure { stderr: String },
    /// The student's script is missing from the cloned tree
    #[error("Script not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },
    /// `docker build` exited non-zero
    #[error("Image build failed for {tag} (exit code {code:?})")]
    BuildFailure { tag: String, code: Option<i32> },
    /// `docker build` exceeded its time budget
    #[error("Image build for {tag} timed out after {secs}s")]
    BuildTimeout { tag: String, secs: u64 },
    /// A collaborator process exceeded its time budget
    #[error("{program} timed out after {secs}s")]
    Timeout {
        program: String,
        secs: u64,
        stage: ErrorStage,
    },
    /// A collaborator process could not be launched or awaited
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        stage: ErrorStage,
        #[source]
        source: std::io::Error,
    },
    /// `docker rmi` failed
    #[error("Image removal failed for {tag}: {reason}")]
    Cleanup { tag: String, reason: String },
    /// Roster could not be read
    #[error("Roster error in {}: {reason}", path.display())]
    Roster { path: PathBuf, reason: String },
    /// Results table could not be written
    #[error("Report error in {}: {reason}", path.display())]
    Report { path: PathBuf, reason: String },
    /// Invalid grader configuration
    #[error("Config error: {reason}")]
    Config { reason: String },
    /// Wrapped anyhow error for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GradeError>;

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Input,
    Workspace,
    Clone,
    Build,
    Verify,
    Cleanup,
    Output,
    Other,
}

impl ErrorStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStage::Input => "input",
            ErrorStage::Workspace => "workspace",
            ErrorStage::Clone => "clone",
            ErrorStage::Build => "build",
            ErrorStage::Verify => "verify",
            ErrorStage::Cleanup => "cleanup",
            ErrorStage::Output => "output",
            ErrorStage::Other => "other",
        }
    }
}

impl GradeError {
    /// Classify the error by the stage that produced it
    pub fn stage(&self) -> ErrorStage {
        match self {
            GradeError::MalformedRow { .. } | GradeError::Roster { .. } => ErrorStage::Input,
            GradeError::Workspace { .. }
            | GradeError::IdentifierCollision { .. }
            | GradeError::EmptyIdentifier { .. } => ErrorStage::Workspace,
            GradeError::CloneFailure { .. } | GradeError::ScriptNotFound { .. } => {
                ErrorStage::Clone
            }
            GradeError::BuildFailure { .. } | GradeError::BuildTimeout { .. } => ErrorStage::Build,
            GradeError::Timeout { stage, .. } | GradeError::Spawn { stage, .. } => *stage,
            GradeError::Cleanup { .. } => ErrorStage::Cleanup,
            GradeError::Report { .. } => ErrorStage::Output,
            GradeError::Config { .. } | GradeError::Other(_) => ErrorStage::Other,
        }
    }

    /// Whether the whole batch must stop rather than just the current submission
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GradeError::Roster { .. } | GradeError::Report { .. } | GradeError::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_failure_display_carries_stderr() {
        let err = GradeError::CloneFailure {
            stderr: "fatal: repository 'x' not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git clone failed"));
        assert!(msg.contains("repository 'x' not found"));
    }

    #[test]
    fn test_script_not_found_names_path() {
        let err = GradeError::ScriptNotFound {
            path: PathBuf::from("grading_workspace/kim/repo/setup/install.sh"),
        };
        assert!(err.to_string().contains("setup/install.sh"));
    }

    #[test]
    fn test_stage_classification() {
        let build = GradeError::BuildTimeout {
            tag: "pyenv-grader-kim".to_string(),
            secs: 300,
        };
        assert_eq!(build.stage(), ErrorStage::Build);
        assert!(!build.is_fatal());

        let roster = GradeError::Roster {
            path: PathBuf::from("submissions.txt"),
            reason: "No such file".to_string(),
        };
        assert_eq!(roster.stage(), ErrorStage::Input);
        assert!(roster.is_fatal());
    }

    #[test]
    fn test_process_errors_keep_caller_stage() {
        let spawn = GradeError::Spawn {
            program: "docker".to_string(),
            stage: ErrorStage::Build,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.stage(), ErrorStage::Build);

        let timeout = GradeError::Timeout {
            program: "git".to_string(),
            secs: 30,
            stage: ErrorStage::Clone,
        };
        assert_eq!(timeout.stage(), ErrorStage::Clone);
    }
}
