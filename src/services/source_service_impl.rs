use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::db::{SourceInsert, Store};
use crate::domain::SourceId;
use crate::domain::events::NotificationEvent;
use crate::models::source::Source;
use crate::services::scan_service::ScanService;
use crate::services::source_service::{SourceError, SourceService};

pub struct SeaOrmSourceService {
    store: Store,
    scans: Arc<dyn ScanService>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmSourceService {
    #[must_use]
    pub fn new(
        store: Store,
        scans: Arc<dyn ScanService>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            scans,
            event_bus,
        }
    }
}

async fn canonical_directory(path: &Path) -> Result<std::path::PathBuf, SourceError> {
    let inaccessible = |message: String| SourceError::PathInaccessible {
        path: path.to_path_buf(),
        message,
    };

    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| inaccessible(e.to_string()))?;

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| inaccessible(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(inaccessible("not a directory".to_string()));
    }

    let _entries = tokio::fs::read_dir(&canonical)
        .await
        .map_err(|e| inaccessible(e.to_string()))?;

    Ok(canonical)
}

#[async_trait::async_trait]
impl SourceService for SeaOrmSourceService {
    async fn add_source(
        &self,
        name: &str,
        root_path: &Path,
        owner_id: i32,
    ) -> Result<Source, SourceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SourceError::Validation("source name cannot be empty".to_string()));
        }

        let root = canonical_directory(root_path).await?;

        match self.store.add_source_exclusive(name, &root, owner_id).await? {
            SourceInsert::Inserted(source) => {
                let _ = self.event_bus.send(NotificationEvent::SourceAdded {
                    source_id: source.id,
                    name: source.name.clone(),
                });
                Ok(source)
            }
            SourceInsert::Overlaps(existing) => Err(SourceError::PathOverlap {
                requested: root,
                existing: Box::new(existing),
            }),
        }
    }

    async fn list_sources(&self) -> Result<Vec<Source>, SourceError> {
        Ok(self.store.list_sources().await?)
    }

    async fn get_source(&self, id: SourceId) -> Result<Source, SourceError> {
        self.store
            .get_source(id)
            .await?
            .ok_or(SourceError::NotFound(id))
    }

    async fn remove_source(&self, id: SourceId) -> Result<(), SourceError> {
        if self.store.get_source(id).await?.is_none() {
            return Err(SourceError::NotFound(id));
        }

        let underway = self
            .scans
            .scan_underway(Some(id))
            .await
            .map_err(|e| SourceError::Database(e.to_string()))?;
        if underway.is_some() {
            return Err(SourceError::ScanInProgress(id));
        }

        if !self.store.remove_source(id).await? {
            return Err(SourceError::NotFound(id));
        }

        info!(event = "source_removed", source_id = %id, "Source removed");
        let _ = self.event_bus.send(NotificationEvent::SourceRemoved { source_id: id });
        Ok(())
    }
}
