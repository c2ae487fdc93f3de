use crate::config::Locale;
use crate::error::{GradeError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Failed,
}

impl Status {
    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Status::Normal, Locale::Ko) => "정상",
            (Status::Failed, Locale::Ko) => "실패",
            (Status::Normal, Locale::En) => "normal",
            (Status::Failed, Locale::En) => "failed",
        }
    }
}

/// One line of the results table
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub name: String,
    pub repo_url: String,
    pub script_path: String,
    pub score: u32,
    pub status: Status,
    pub log: String,
}

/// Trim and cut `log` to at most `limit` characters.
pub fn truncate_log(log: &str, limit: usize) -> String {
    log.trim().chars().take(limit).collect()
}

pub fn header(locale: Locale) -> [&'static str; 6] {
    match locale {
        Locale::Ko => ["이름", "레포지토리", "스크립트경로", "점수", "결과", "로그요약"],
        Locale::En => ["name", "repository", "script_path", "score", "status", "log"],
    }
}

/// Write the header and every row in one pass.
pub fn write_results_to<W: Write>(writer: W, rows: &[ResultRow], locale: Locale) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(locale))?;
    for row in rows {
        let score = row.score.to_string();
        csv_writer.write_record([
            row.name.as_str(),
            row.repo_url.as_str(),
            row.script_path.as_str(),
            score.as_str(),
            row.status.label(locale),
            row.log.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_results(path: &Path, rows: &[ResultRow], locale: Locale) -> Result<()> {
    let report_err = |reason: String| GradeError::Report {
        path: path.to_path_buf(),
        reason,
    };
    let file = std::fs::File::create(path).map_err(|e| report_err(e.to_string()))?;
    write_results_to(file, rows, locale).map_err(|e| report_err(e.to_string()))
}
