//! Machine-readable record of an import run

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::import::row::RowStatus;
use crate::import::session::ImportSession;

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub generated_at: DateTime<Utc>,
    pub source: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
    pub rows: Vec<RowReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    /// 1-based, as shown to the user
    pub row: usize,
    pub name: String,
    pub status: RowStatus,
    pub examples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl ImportReport {
    /// Snapshot the session's rows after a run
    pub fn from_session(session: &ImportSession, source: Option<&Path>) -> Self {
        let rows: Vec<RowReport> = session
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| RowReport {
                row: i + 1,
                name: row.name.clone(),
                status: row.status,
                examples: row.example_count(),
                error: row.error.clone(),
                validation_error: row.validation_error.clone(),
            })
            .collect();

        let count = |status: RowStatus| rows.iter().filter(|r| r.status == status).count();

        Self {
            generated_at: Utc::now(),
            source: source.map(|p| p.display().to_string()),
            succeeded: count(RowStatus::Success),
            failed: count(RowStatus::Error),
            pending: count(RowStatus::Pending),
            rows,
        }
    }

    /// Whether the last run left nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
