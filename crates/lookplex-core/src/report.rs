//! Batch summaries and the JSON run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `format` tag written into every run report
pub const REPORT_FORMAT: &str = "lookplex-run/1";

/// Outcome counts for one batch of independent operations
///
/// `succeeded` includes idempotent hits (already existing entries or
/// links); `skipped` counts pairs or files that were never attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// What the batch did (e.g. "views", "dashboard → explore links")
    pub label: String,

    /// Items attempted
    pub processed: usize,

    /// Items that ended in the desired state
    pub succeeded: usize,

    /// Items not attempted
    pub skipped: usize,

    /// Items that failed
    pub failed: usize,
}

impl BatchSummary {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Record a boolean outcome
    pub fn record(&mut self, success: bool) {
        if success {
            self.record_success();
        } else {
            self.record_failure();
        }
    }

    /// Fold another batch into this one
    pub fn absorb(&mut self, other: &BatchSummary) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}/{}", self.label, self.succeeded, self.processed)?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read report from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not a {expected} report (found {found:?})")]
    Format {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
}

/// Batches of one command invocation, with running totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Always [`REPORT_FORMAT`] when written by this version
    pub format: String,

    /// `setup`, `ingest`, `links` or `lineage`
    pub command: String,

    pub started_at: DateTime<Utc>,

    pub batches: Vec<BatchSummary>,

    /// Sum of `batches`, labelled "total"
    totals: BatchSummary,
}

impl RunReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            format: REPORT_FORMAT.to_string(),
            command: command.into(),
            started_at: Utc::now(),
            batches: Vec::new(),
            totals: BatchSummary::new("total"),
        }
    }

    pub fn add_batch(&mut self, batch: BatchSummary) {
        self.totals.absorb(&batch);
        self.batches.push(batch);
    }

    pub fn totals(&self) -> &BatchSummary {
        &self.totals
    }

    pub fn has_failures(&self) -> bool {
        self.totals.has_failures()
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_json()?).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a report written by [`RunReport::write_to`]
    pub fn read_from(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let report: RunReport = serde_json::from_str(&content)?;
        if report.format != REPORT_FORMAT {
            return Err(ReportError::Format {
                path: path.to_path_buf(),
                expected: REPORT_FORMAT,
                found: report.format,
            });
        }
        Ok(report)
    }
}
