//! Applies computed changes to the persisted media catalog.
//!
//! Both conflict cases are tolerated: adding a path that is already
//! catalogued and removing a path that is already gone are silent no-ops.
//! Counts report what was actually applied.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::diff::{ChangeKind, ChangeRecord};
use super::fs::FileSystem;
use super::snapshot::resolve;
use crate::domain::{MediaId, SourceId};
use crate::models::media::{MediaRecord, NewMedia};
use crate::models::scan::ChangeCounts;
use crate::models::source::Source;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Media persistence needed by the reconciler.
#[async_trait::async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn media_for_source(&self, source_id: SourceId) -> Result<Vec<MediaRecord>, CatalogError>;

    /// Returns `true` when a row was written, `false` if the path already existed.
    async fn insert_if_absent(&self, media: NewMedia) -> Result<bool, CatalogError>;

    /// Returns `true` when a row was deleted.
    async fn delete_by_path(&self, path: &str) -> Result<bool, CatalogError>;

    async fn delete_by_ids(&self, ids: &[MediaId]) -> Result<u64, CatalogError>;
}

pub struct Reconciler<'a, C: MediaCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: MediaCatalog + ?Sized> Reconciler<'a, C> {
    pub const fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Applies `changes` for `source`, accumulating applied counts into `counts`.
    ///
    /// On error `counts` still holds everything applied before the failure.
    pub async fn apply(
        &self,
        source: &Source,
        changes: &[ChangeRecord],
        counts: &mut ChangeCounts,
    ) -> Result<(), CatalogError> {
        for change in changes {
            let path = resolve(source.root(), &change.path, &change.name)
                .to_string_lossy()
                .to_string();

            match change.kind {
                ChangeKind::Removed => {
                    if self.catalog.delete_by_path(&path).await? {
                        counts.removed = counts.removed.saturating_add(1);
                    } else {
                        debug!(path = %path, "Removed file had no catalog record");
                    }
                }
                ChangeKind::Added => {
                    if self
                        .catalog
                        .insert_if_absent(NewMedia::guess(source.id, path.clone()))
                        .await?
                    {
                        counts.added = counts.added.saturating_add(1);
                    } else {
                        debug!(path = %path, "Added file already catalogued");
                    }
                }
            }
        }
        Ok(())
    }

    /// Deletes every record of `source_id` whose file can no longer be read.
    pub async fn prune_unreachable(
        &self,
        source_id: SourceId,
        fs: Arc<dyn FileSystem>,
        counts: &mut ChangeCounts,
    ) -> Result<(), CatalogError> {
        let records = self.catalog.media_for_source(source_id).await?;
        if records.is_empty() {
            return Ok(());
        }

        let candidates: Vec<(MediaId, PathBuf)> = records
            .into_iter()
            .map(|r| (r.id, PathBuf::from(r.path)))
            .collect();

        let unreachable: Vec<MediaId> = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .filter(|(_, path)| !fs.is_readable(path))
                .map(|(id, _)| id)
                .collect()
        })
        .await
        .map_err(|e| CatalogError::Internal(format!("liveness check panicked: {e}")))?;

        if unreachable.is_empty() {
            return Ok(());
        }

        let deleted = self.catalog.delete_by_ids(&unreachable).await?;
        let deleted = i32::try_from(deleted).unwrap_or(i32::MAX);
        counts.removed = counts.removed.saturating_add(deleted);

        info!(
            event = "liveness_prune",
            source_id = %source_id,
            pruned = deleted,
            "Pruned records of unreadable files"
        );
        Ok(())
    }
}
