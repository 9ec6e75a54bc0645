use crate::domain::{MediaId, ScanId, SingleFlightPolicy, SourceId};
use crate::library::reconcile::{CatalogError, MediaCatalog};
use crate::models::media::{MediaRecord, NewMedia};
use crate::models::scan::Scan;
use crate::models::source::Source;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::scan::{ScanBegin, ScanCompletion};
pub use repositories::source::SourceInsert;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn source_repo(&self) -> repositories::source::SourceRepository {
        repositories::source::SourceRepository::new(self.conn.clone())
    }

    fn media_repo(&self) -> repositories::media::MediaRepository {
        repositories::media::MediaRepository::new(self.conn.clone())
    }

    fn scan_repo(&self) -> repositories::scan::ScanRepository {
        repositories::scan::ScanRepository::new(self.conn.clone())
    }

    // Sources

    pub async fn add_source_exclusive(
        &self,
        name: &str,
        root_path: &Path,
        owner_id: i32,
    ) -> Result<SourceInsert> {
        self.source_repo()
            .add_exclusive(name, root_path, owner_id)
            .await
    }

    pub async fn get_source(&self, id: SourceId) -> Result<Option<Source>> {
        self.source_repo().get(id).await
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        self.source_repo().list_all().await
    }

    pub async fn remove_source(&self, id: SourceId) -> Result<bool> {
        self.source_repo().remove(id).await
    }

    // Media

    pub async fn list_media_for_source(&self, source_id: SourceId) -> Result<Vec<MediaRecord>> {
        self.media_repo().list_for_source(source_id).await
    }

    pub async fn get_media_by_path(&self, path: &str) -> Result<Option<MediaRecord>> {
        self.media_repo().get_by_path(path).await
    }

    pub async fn count_media_for_source(&self, source_id: SourceId) -> Result<u64> {
        self.media_repo().count_for_source(source_id).await
    }

    pub async fn insert_media_if_absent(&self, media: NewMedia) -> Result<bool> {
        self.media_repo().insert_if_absent(media).await
    }

    pub async fn delete_media_by_path(&self, path: &str) -> Result<bool> {
        self.media_repo().delete_by_path(path).await
    }

    pub async fn delete_media_by_ids(&self, ids: &[MediaId]) -> Result<u64> {
        self.media_repo().delete_by_ids(ids).await
    }

    // Scans

    pub async fn begin_scan_exclusive(
        &self,
        source_id: SourceId,
        policy: SingleFlightPolicy,
        process_started_at: DateTime<Utc>,
    ) -> Result<ScanBegin> {
        self.scan_repo()
            .begin_exclusive(source_id, policy, process_started_at)
            .await
    }

    pub async fn finalize_scan(&self, id: ScanId, completion: ScanCompletion) -> Result<bool> {
        self.scan_repo().finalize(id, completion).await
    }

    pub async fn get_scan(&self, id: ScanId) -> Result<Option<Scan>> {
        self.scan_repo().get(id).await
    }

    pub async fn scan_history(&self, source_id: SourceId, limit: Option<u64>) -> Result<Vec<Scan>> {
        self.scan_repo().history(source_id, limit).await
    }

    pub async fn list_open_scans(&self, source_id: Option<SourceId>) -> Result<Vec<Scan>> {
        self.scan_repo().list_open(source_id).await
    }
}

#[async_trait::async_trait]
impl MediaCatalog for Store {
    async fn media_for_source(&self, source_id: SourceId) -> Result<Vec<MediaRecord>, CatalogError> {
        Ok(self.list_media_for_source(source_id).await?)
    }

    async fn insert_if_absent(&self, media: NewMedia) -> Result<bool, CatalogError> {
        Ok(self.insert_media_if_absent(media).await?)
    }

    async fn delete_by_path(&self, path: &str) -> Result<bool, CatalogError> {
        Ok(self.delete_media_by_path(path).await?)
    }

    async fn delete_by_ids(&self, ids: &[MediaId]) -> Result<u64, CatalogError> {
        Ok(self.delete_media_by_ids(ids).await?)
    }
}
