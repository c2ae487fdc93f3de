use crate::config::GraderConfig;
use crate::docker::{build_image, ContainerEngine};
use crate::error::{GradeError, Result};
use crate::git::{fetch_repository, VersionControl};
use crate::report::{truncate_log, write_results, ResultRow, Status};
use crate::roster::{read_roster, RosterEntry, Submission};
use crate::sanitize::sanitize_name;
use crate::verify::{run_check, Verification};
use crate::workspace::WorkspaceManager;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

/// Where a submission is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Pending,
    WorkspaceReady,
    Cloned,
    ImageBuilt,
    Verified,
    Scored,
    Failed,
}

/// Counts for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub passed: usize,
    pub failed: usize,
    /// Malformed roster rows
    pub skipped: usize,
}

impl BatchSummary {
    pub fn graded(&self) -> usize {
        self.passed + self.failed
    }
}

/// A built (or possibly half-built) image that must be removed exactly once.
pub struct ImageLease {
    tag: String,
    released: bool,
}

impl ImageLease {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            released: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Best-effort removal. Failures are logged and never surface.
    pub async fn release(mut self, engine: &dyn ContainerEngine) {
        self.released = true;
        if let Err(e) = engine.remove_image(&self.tag).await {
            tracing::warn!(tag = %self.tag, error = %e, "image cleanup failed");
        }
    }
}

impl Drop for ImageLease {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(tag = %self.tag, "image lease dropped without cleanup");
        }
    }
}

pub struct Grader {
    config: GraderConfig,
    workspaces: WorkspaceManager,
    vcs: Arc<dyn VersionControl>,
    engine: Arc<dyn ContainerEngine>,
    /// identifier -> display name that first claimed it in this run
    claimed: HashMap<String, String>,
}

impl Grader {
    pub fn new(
        config: GraderConfig,
        vcs: Arc<dyn VersionControl>,
        engine: Arc<dyn ContainerEngine>,
    ) -> Self {
        let workspaces = WorkspaceManager::new(config.workspace_root.clone());
        Self {
            config,
            workspaces,
            vcs,
            engine,
            claimed: HashMap::new(),
        }
    }

    /// Grade every row in `roster` and write the table to `results`.
    ///
    /// Only roster I/O and the final write can fail the run.
    pub async fn grade_submissions(&mut self, roster: &Path, results: &Path) -> Result<BatchSummary> {
        self.workspaces.ensure_root()?;
        let entries = read_roster(roster)?;

        let (rows, summary) = self.grade_entries(entries).await;

        write_results(results, &rows, self.config.locale)?;
        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "batch finished"
        );
        println!("✅ Grading complete: {} written", results.display());
        Ok(summary)
    }

    pub async fn grade_entries(&mut self, entries: Vec<RosterEntry>) -> (Vec<ResultRow>, BatchSummary) {
        let mut rows = Vec::new();
        let mut summary = BatchSummary::default();

        for entry in entries {
            match entry {
                RosterEntry::Malformed(e) => {
                    eprintln!("❗ Skipping row: {}", e);
                    tracing::warn!(error = %e, "malformed roster row");
                    summary.skipped += 1;
                }
                RosterEntry::Submission(submission) => {
                    println!("▶️  Grading: {}", submission.name);
                    let row = self.grade_one(&submission).await;
                    match row.status {
                        Status::Normal => summary.passed += 1,
                        Status::Failed => summary.failed += 1,
                    }
                    rows.push(row);
                }
            }
        }

        (rows, summary)
    }

    /// Run one submission end to end. Always yields a row and always attempts cleanup.
    pub async fn grade_one(&mut self, submission: &Submission) -> ResultRow {
        let identifier = sanitize_name(&submission.name);
        let span = tracing::info_span!(
            "submission",
            name = %submission.name,
            identifier = %identifier
        );

        async {
            let lease = ImageLease::new(self.config.image_tag(&identifier));
            let mut stage = SubmissionStage::Pending;

            let outcome = self.run_pipeline(submission, &identifier, lease.tag(), &mut stage).await;
            lease.release(self.engine.as_ref()).await;

            let row = self.score(submission, outcome, &mut stage);
            tracing::info!(stage = ?stage, score = row.score, "submission recorded");
            row
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(
        &mut self,
        submission: &Submission,
        identifier: &str,
        tag: &str,
        stage: &mut SubmissionStage,
    ) -> Result<Verification> {
        self.claim_identifier(&submission.name, identifier)?;

        let workspace = self.workspaces.prepare(&submission.name)?;
        *stage = SubmissionStage::WorkspaceReady;

        let script_path = submission.script_path();
        fetch_repository(self.vcs.as_ref(), &submission.repo_url, &workspace, &script_path).await?;
        *stage = SubmissionStage::Cloned;

        build_image(self.engine.as_ref(), &workspace, &script_path, tag, &self.config).await?;
        *stage = SubmissionStage::ImageBuilt;

        let verification = run_check(self.engine.as_ref(), tag, &self.config).await;
        *stage = SubmissionStage::Verified;
        Ok(verification)
    }

    fn claim_identifier(&mut self, name: &str, identifier: &str) -> Result<()> {
        if identifier.is_empty() {
            return Err(GradeError::EmptyIdentifier {
                name: name.to_string(),
            });
        }
        match self.claimed.get(identifier) {
            Some(previous) if previous != name => Err(GradeError::IdentifierCollision {
                name: name.to_string(),
                identifier: identifier.to_string(),
                previous: previous.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed.insert(identifier.to_string(), name.to_string());
                Ok(())
            }
        }
    }

    fn score(
        &self,
        submission: &Submission,
        outcome: Result<Verification>,
        stage: &mut SubmissionStage,
    ) -> ResultRow {
        let (score, status, log) = match outcome {
            Ok(v) if v.passed => (self.config.success_score, Status::Normal, v.log),
            Ok(v) => (self.config.failure_score, Status::Failed, v.log),
            Err(e) => {
                tracing::warn!(stage = e.stage().as_str(), error = %e, "submission failed");
                *stage = SubmissionStage::Failed;
                (self.config.failure_score, Status::Failed, e.to_string())
            }
        };
        if *stage != SubmissionStage::Failed {
            *stage = SubmissionStage::Scored;
        }

        ResultRow {
            name: submission.name.clone(),
            repo_url: submission.repo_url.clone(),
            script_path: submission.script_path(),
            score,
            status,
            log: truncate_log(&log, self.config.log_limit),
        }
    }
}
