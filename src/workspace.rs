use crate::error::{GradeError, Result};
use crate::sanitize::sanitize_name;
use std::fs;
use std::path::PathBuf;

/// Per-submission scratch directory: `<root>/<identifier>/`
#[derive(Debug, Clone)]
pub struct Workspace {
    pub identifier: String,
    pub dir: PathBuf,
}

impl Workspace {
    /// Destination of the cloned repository
    pub fn repo_dir(&self) -> PathBuf {
        self.dir.join("repo")
    }

    pub fn dockerfile_path(&self) -> PathBuf {
        self.dir.join("Dockerfile")
    }
}

pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the workspace root if it is missing.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| GradeError::Workspace {
            path: self.root.clone(),
            source,
        })
    }

    /// Wipe and recreate the directory for `name`.
    pub fn prepare(&self, name: &str) -> Result<Workspace> {
        let identifier = sanitize_name(name);
        let dir = self.root.join(&identifier);

        if dir.exists() {
            tracing::debug!(path = %dir.display(), "removing stale workspace");
            fs::remove_dir_all(&dir).map_err(|source| GradeError::Workspace {
                path: dir.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&dir).map_err(|source| GradeError::Workspace {
            path: dir.clone(),
            source,
        })?;

        Ok(Workspace { identifier, dir })
    }
}
