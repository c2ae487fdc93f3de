//! Toolchain verification inside a freshly built image.

use crate::config::{GraderConfig, VerifyMode};
use crate::docker::ContainerEngine;
use regex::Regex;
use std::sync::OnceLock;

/// Outcome of the in-container check. Never an error: run failures become `passed = false`.
#[derive(Debug, Clone)]
pub struct Verification {
    pub passed: bool,
    pub log: String,
}

/// Versions reported by the diagnostic command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionReport {
    pub manager: Option<Vec<u64>>,
    pub interpreter: Option<Vec<u64>>,
}

/// Whitespace, optional `v`, then a dotted version.
fn version_after_label() -> &'static Regex {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    VERSION_RE.get_or_init(|| Regex::new(r"^\s+(v?)(\d+(?:\.\d+)*)").expect("valid regex"))
}

impl VersionReport {
    /// Pull `<token> X.Y.Z` and `Python X.Y.Z` lines out of the output.
    ///
    /// The token is matched case-insensitively at the start of a line; the first hit wins.
    pub fn parse(output: &str, manager_token: &str) -> Self {
        let mut report = Self::default();
        for line in output.lines() {
            let line = line.trim_start();
            if report.manager.is_none() {
                report.manager = labelled_version(line, manager_token, true);
            }
            if report.interpreter.is_none() {
                report.interpreter = labelled_version(line, "Python", false);
            }
        }
        report
    }

    /// Manager present and interpreter version starts with `target` component-wise.
    pub fn satisfies(&self, target: &[u64]) -> bool {
        match (&self.manager, &self.interpreter) {
            (Some(_), Some(version)) => version.starts_with(target),
            _ => false,
        }
    }
}

fn labelled_version(line: &str, label: &str, loose: bool) -> Option<Vec<u64>> {
    let head = line.get(..label.len())?;
    let matches = if loose {
        head.eq_ignore_ascii_case(label)
    } else {
        head == label
    };
    if label.is_empty() || !matches {
        return None;
    }
    let caps = version_after_label().captures(&line[label.len()..])?;
    if !loose && !caps[1].is_empty() {
        return None;
    }
    parse_version(&caps[2])
}

/// `"3.12.4"` -> `[3, 12, 4]`
pub fn parse_version(text: &str) -> Option<Vec<u64>> {
    text.trim()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Judge diagnostic output against the configured markers.
pub fn evaluate(output: &str, config: &GraderConfig) -> bool {
    match config.verify_mode {
        VerifyMode::Substring => {
            output.contains(&config.version_manager_token)
                && output.contains(&config.target_version)
        }
        VerifyMode::Structured => match parse_version(&config.target_version) {
            Some(target) => {
                VersionReport::parse(output, &config.version_manager_token).satisfies(&target)
            }
            None => {
                tracing::warn!(target_version = %config.target_version, "unparseable target version");
                false
            }
        },
    }
}

/// Start a transient container from `tag` and check the installed toolchain.
pub async fn run_check(
    engine: &dyn ContainerEngine,
    tag: &str,
    config: &GraderConfig,
) -> Verification {
    match engine
        .run(tag, &config.check_command, config.run_timeout())
        .await
    {
        Ok(output) => {
            let passed = evaluate(&output, config);
            tracing::info!(tag, passed, "verification finished");
            Verification {
                passed,
                log: output,
            }
        }
        Err(e) => {
            tracing::warn!(tag, error = %e, "verification run failed");
            Verification {
                passed: false,
                log: format!("exception during run: {}", e),
            }
        }
    }
}
