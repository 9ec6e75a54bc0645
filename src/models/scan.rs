use crate::domain::{ScanId, SourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one scan row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Running,
    Completed,
    Failed,
    /// Left open by a process that died before finalizing it.
    Abandoned,
}

impl ScanState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    pub id: ScanId,
    pub source_id: SourceId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub changes_added: Option<i32>,
    pub changes_removed: Option<i32>,
    pub error: Option<String>,
}

impl Scan {
    /// Derives the lifecycle state relative to the start of the current process.
    #[must_use]
    pub fn state(&self, process_started_at: DateTime<Utc>) -> ScanState {
        match (&self.ended_at, &self.error) {
            (Some(_), None) => ScanState::Completed,
            (Some(_), Some(_)) => ScanState::Failed,
            (None, _) if self.started_at < process_started_at => ScanState::Abandoned,
            (None, _) => ScanState::Running,
        }
    }

    /// True when this row still blocks a new scan of its source.
    #[must_use]
    pub fn is_running(&self, process_started_at: DateTime<Utc>) -> bool {
        self.state(process_started_at) == ScanState::Running
    }

    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Applied change counts of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub added: i32,
    pub removed: i32,
}
