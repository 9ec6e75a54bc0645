//! Domain service for scan lifecycles.
//!
//! A scan moves through `Running` to `Completed` or `Failed`. Rows left open
//! by a process that died mid-scan are `Abandoned`: they stay in history as
//! written and never block a new scan.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ScanId, SourceId};
use crate::library::{CatalogError, SnapshotError};
use crate::models::scan::{Scan, ScanState};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Source not found: {0}")]
    SourceNotFound(SourceId),

    #[error("A scan of source {0} is already running")]
    AlreadyRunning(SourceId),

    #[error("Source root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Source root is inaccessible: {}: {message}", .path.display())]
    InaccessibleDirectory { path: PathBuf, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ScanError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ScanError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<CatalogError> for ScanError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Database(msg) => Self::Database(msg),
            CatalogError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<SnapshotError> for ScanError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::NotADirectory(path) => Self::NotADirectory(path),
            SnapshotError::InaccessibleDirectory { path, source } => Self::InaccessibleDirectory {
                path,
                message: source.to_string(),
            },
        }
    }
}

/// Result of one source within [`ScanService::scan_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ScanAllEntry {
    pub source_id: SourceId,
    pub scan: Option<Scan>,
    pub error: Option<String>,
}

/// Orchestrates scans of library sources.
///
/// ```rust,ignore
/// use shelfsync::services::{ScanError, ScanService};
/// use std::sync::Arc;
///
/// async fn rescan(service: Arc<dyn ScanService>, id: SourceId) -> Result<(), ScanError> {
///     let scan = service.scan_source(id).await?;
///     println!("+{:?} -{:?}", scan.changes_added, scan.changes_removed);
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait ScanService: Send + Sync {
    /// Runs a full scan of one source and returns the finalized row.
    ///
    /// # Errors
    ///
    /// - [`ScanError::SourceNotFound`] if the source does not exist.
    /// - [`ScanError::NotADirectory`] / [`ScanError::InaccessibleDirectory`] if the
    ///   root cannot be walked. No scan row is created.
    /// - [`ScanError::AlreadyRunning`] if a scan of this source (or of any
    ///   source under the global policy) is running. No scan row is created.
    /// - [`ScanError::Database`] if a catalog write fails. The row is finalized
    ///   as failed with the counts applied so far.
    async fn scan_source(&self, source_id: SourceId) -> Result<Scan, ScanError>;

    /// Starts a scan and returns the running row; the work continues on a
    /// background task. Start-up errors are the same as [`Self::scan_source`].
    async fn spawn_scan(self: Arc<Self>, source_id: SourceId) -> Result<Scan, ScanError>;

    /// Scans every source in turn. A failing source does not stop the others.
    async fn scan_all(&self) -> Result<Vec<ScanAllEntry>, ScanError>;

    /// Scans of one source, newest first.
    async fn scan_history(
        &self,
        source_id: SourceId,
        limit: Option<u64>,
    ) -> Result<Vec<Scan>, ScanError>;

    /// The source whose scan is running, if any. With `None`, every source is
    /// considered.
    async fn scan_underway(&self, source_id: Option<SourceId>)
    -> Result<Option<SourceId>, ScanError>;

    async fn get_scan(&self, scan_id: ScanId) -> Result<Option<Scan>, ScanError>;

    /// Lifecycle state of `scan` as seen by this process.
    fn scan_state(&self, scan: &Scan) -> ScanState;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn scan_error_display() {
        let err = ScanError::SourceNotFound(SourceId::new(3));
        assert_eq!(err.to_string(), "Source not found: 3");

        let err = ScanError::AlreadyRunning(SourceId::new(1));
        assert_eq!(err.to_string(), "A scan of source 1 is already running");
    }

    #[test]
    fn snapshot_errors_keep_their_kind() {
        let err: ScanError = SnapshotError::NotADirectory(PathBuf::from("/a")).into();
        assert!(matches!(err, ScanError::NotADirectory(_)));

        let err: ScanError = SnapshotError::InaccessibleDirectory {
            path: PathBuf::from("/b"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, ScanError::InaccessibleDirectory { .. }));
    }

    #[test]
    fn catalog_errors_map_to_database() {
        let err: ScanError = CatalogError::Database("disk full".to_string()).into();
        assert!(matches!(err, ScanError::Database(msg) if msg == "disk full"));
    }
}
