//! `pyenv-grader`: clone each student's repository, build their setup script into an
//! image and check that pyenv and the target Python version are installed.

use anyhow::{Context, Result};
use clap::Parser;
use pyenv_grader::docker::DockerCli;
use pyenv_grader::git::GitCli;
use pyenv_grader::telemetry::init_tracing;
use pyenv_grader::{Grader, GraderConfig, Locale, VerifyMode};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "pyenv-grader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch-grade pyenv setup scripts in throwaway Docker images", long_about = None)]
struct Cli {
    /// Roster: name, repository URL, script directory, script file
    #[arg(long, default_value = "submissions.txt", env = "GRADER_ROSTER")]
    roster: PathBuf,

    /// Results table to write
    #[arg(short, long, default_value = "results.csv", env = "GRADER_OUTPUT")]
    output: PathBuf,

    /// JSON config file; flags below override it
    #[arg(short, long, env = "GRADER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "GRADER_WORKSPACE")]
    workspace: Option<PathBuf>,

    #[arg(long)]
    base_image: Option<String>,

    /// Seconds allowed for `docker build`
    #[arg(long)]
    build_timeout: Option<u64>,

    /// Seconds allowed for the verification container
    #[arg(long)]
    run_timeout: Option<u64>,

    /// Seconds allowed for `git clone` (unbounded when unset)
    #[arg(long)]
    clone_timeout: Option<u64>,

    /// Python version prefix the image must provide
    #[arg(long)]
    target_version: Option<String>,

    /// Results language: ko or en
    #[arg(long)]
    locale: Option<Locale>,

    /// Use plain substring matching instead of version parsing
    #[arg(long)]
    substring_check: bool,

    /// Docker-compatible CLI to invoke
    #[arg(long, default_value = "docker", env = "GRADER_ENGINE")]
    engine: String,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<GraderConfig> {
        let mut config = match &self.config {
            Some(path) => GraderConfig::from_file(path)?,
            None => GraderConfig::default(),
        };

        if let Some(dir) = &self.workspace {
            config.workspace_root = dir.clone();
        }
        if let Some(image) = &self.base_image {
            config.base_image = image.clone();
        }
        if let Some(secs) = self.build_timeout {
            config.build_timeout_secs = secs;
        }
        if let Some(secs) = self.run_timeout {
            config.run_timeout_secs = secs;
        }
        if self.clone_timeout.is_some() {
            config.clone_timeout_secs = self.clone_timeout;
        }
        if let Some(version) = &self.target_version {
            config.target_version = version.clone();
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if self.substring_check {
            config.verify_mode = VerifyMode::Substring;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(
        cli.json_logs,
        if cli.verbose { Level::DEBUG } else { Level::INFO },
    );

    let config = cli.resolve_config().context("invalid grader configuration")?;
    tracing::debug!(?config, "configuration resolved");

    let vcs = Arc::new(GitCli::new(config.clone_timeout()));
    let engine = Arc::new(DockerCli::with_program(cli.engine.clone()));
    let mut grader = Grader::new(config, vcs, engine);

    grader
        .grade_submissions(&cli.roster, &cli.output)
        .await
        .with_context(|| format!("grading {} failed", cli.roster.display()))?;

    Ok(())
}
