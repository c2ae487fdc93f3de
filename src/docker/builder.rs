use crate::config::GraderConfig;
use crate::docker::descriptor::BuildDescriptor;
use crate::docker::engine::ContainerEngine;
use crate::error::{GradeError, Result};
use crate::workspace::Workspace;
use std::fs;

/// Write the workspace Dockerfile and build it into `tag`.
pub async fn build_image(
    engine: &dyn ContainerEngine,
    workspace: &Workspace,
    script_rel: &str,
    tag: &str,
    config: &GraderConfig,
) -> Result<()> {
    let descriptor = BuildDescriptor::for_script(&config.base_image, script_rel);
    let dockerfile = workspace.dockerfile_path();
    fs::write(&dockerfile, descriptor.render()).map_err(|source| GradeError::Workspace {
        path: dockerfile.clone(),
        source,
    })?;

    tracing::info!(tag, timeout_secs = config.build_timeout_secs, "building image");
    engine
        .build(&workspace.dir, tag, config.build_timeout())
        .await?;
    tracing::info!(tag, "image built");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::WorkspaceManager;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingEngine {
        builds: Mutex<Vec<(PathBuf, String, Duration)>>,
    }

    #[async_trait]
    impl ContainerEngine for RecordingEngine {
        async fn build(&self, context_dir: &Path, tag: &str, timeout: Duration) -> Result<()> {
            assert!(context_dir.join("Dockerfile").is_file());
            self.builds
                .lock()
                .unwrap()
                .push((context_dir.to_path_buf(), tag.to_string(), timeout));
            Ok(())
        }

        async fn run(&self, _tag: &str, _command: &str, _timeout: Duration) -> Result<String> {
            unreachable!()
        }

        async fn remove_image(&self, _tag: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_build_writes_dockerfile_and_invokes_engine() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = WorkspaceManager::new(tmp.path()).prepare("Lee").unwrap();
        let engine = RecordingEngine::default();
        let config = GraderConfig::default();

        build_image(&engine, &ws, "setup/pyenv.sh", "pyenv-grader-lee", &config)
            .await
            .unwrap();

        let text = fs::read_to_string(ws.dockerfile_path()).unwrap();
        assert!(text.contains("COPY repo/setup/pyenv.sh /tmp/script.sh"));

        let builds = engine.builds.lock().unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].0, ws.dir);
        assert_eq!(builds[0].1, "pyenv-grader-lee");
        assert_eq!(builds[0].2, Duration::from_secs(300));
    }
}
