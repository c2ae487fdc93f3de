use crate::error::{GradeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the verification output is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Parse `pyenv X.Y.Z` / `Python X.Y.Z` lines and compare versions
    #[default]
    Structured,
    /// Plain containment of the token and the version prefix
    Substring,
}

/// Language of the results header and status labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl std::str::FromStr for Locale {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ko" => Ok(Locale::Ko),
            "en" => Ok(Locale::En),
            other => Err(GradeError::Config {
                reason: format!("unknown locale '{}', expected 'ko' or 'en'", other),
            }),
        }
    }
}

/// Settings shared by every grading component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    pub workspace_root: PathBuf,
    pub base_image: String,
    pub image_prefix: String,
    pub build_timeout_secs: u64,
    pub run_timeout_secs: u64,
    /// Unset means clone may block indefinitely
    pub clone_timeout_secs: Option<u64>,
    pub check_command: String,
    pub version_manager_token: String,
    pub target_version: String,
    pub success_score: u32,
    pub failure_score: u32,
    pub log_limit: usize,
    pub verify_mode: VerifyMode,
    pub locale: Locale,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("grading_workspace"),
            base_image: "debian:latest".to_string(),
            image_prefix: "pyenv-grader-".to_string(),
            build_timeout_secs: 300,
            run_timeout_secs: 60,
            clone_timeout_secs: None,
            check_command: "pyenv -v && python --version".to_string(),
            version_manager_token: "pyenv".to_string(),
            target_version: "3.12".to_string(),
            success_score: 100,
            failure_score: 70,
            log_limit: 300,
            verify_mode: VerifyMode::Structured,
            locale: Locale::Ko,
        }
    }
}

impl GraderConfig {
    /// Load a (possibly partial) JSON config; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| GradeError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| GradeError::Config {
            reason: format!("invalid config {}: {}", path.display(), e),
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let reject = |reason: &str| {
            Err(GradeError::Config {
                reason: reason.to_string(),
            })
        };

        if self.build_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return reject("build and run timeouts must be greater than zero");
        }
        if self.clone_timeout_secs == Some(0) {
            return reject("clone timeout must be greater than zero when set");
        }
        if self.target_version.trim().is_empty() {
            return reject("target version must not be empty");
        }
        if self.verify_mode == VerifyMode::Structured
            && crate::verify::parse_version(&self.target_version).is_none()
        {
            return reject("target version must be dotted numbers such as 3.12 for structured verification");
        }
        if self.image_prefix.is_empty() {
            return reject("image prefix must not be empty");
        }
        if self.success_score <= self.failure_score {
            return reject("success score must be above failure score");
        }
        Ok(())
    }

    pub fn image_tag(&self, identifier: &str) -> String {
        format!("{}{}", self.image_prefix, identifier)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn clone_timeout(&self) -> Option<Duration> {
        self.clone_timeout_secs.map(Duration::from_secs)
    }
}
