pub mod config;
pub mod docker;
pub mod error;
pub mod git;
pub mod grader;
pub mod process;
pub mod report;
pub mod roster;
pub mod sanitize;
pub mod telemetry;
pub mod verify;
pub mod workspace;

pub use config::{GraderConfig, Locale, VerifyMode};
pub use error::{GradeError, Result};
pub use grader::{BatchSummary, Grader};
