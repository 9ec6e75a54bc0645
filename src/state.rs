use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::ProcessClock;
use crate::domain::events::NotificationEvent;
use crate::library::{FileSystem, LocalFileSystem};
use crate::services::{
    ScanService, Scheduler, SeaOrmScanService, SeaOrmSourceService, SourceService,
};

/// Everything a command or the daemon needs, wired once at start-up.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub fs: Arc<dyn FileSystem>,

    pub clock: ProcessClock,

    pub event_bus: broadcast::Sender<NotificationEvent>,

    pub scan_service: Arc<dyn ScanService>,

    pub source_service: Arc<dyn SourceService>,
}

impl AppContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new(config.library.follow_links));
        Ok(Self::with_parts(config, store, fs, ProcessClock::new()))
    }

    /// Wires the services over an already-open store.
    #[must_use]
    pub fn with_parts(
        config: Config,
        store: Store,
        fs: Arc<dyn FileSystem>,
        clock: ProcessClock,
    ) -> Self {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
        let config = Arc::new(RwLock::new(config));

        let scan_service: Arc<dyn ScanService> = Arc::new(SeaOrmScanService::new(
            store.clone(),
            Arc::clone(&fs),
            Arc::clone(&config),
            clock,
            event_bus.clone(),
        ));

        let source_service: Arc<dyn SourceService> = Arc::new(SeaOrmSourceService::new(
            store.clone(),
            Arc::clone(&scan_service),
            event_bus.clone(),
        ));

        Self {
            config,
            store,
            fs,
            clock,
            event_bus,
            scan_service,
            source_service,
        }
    }

    pub async fn scheduler(&self) -> Scheduler {
        let scanner = self.config.read().await.scanner.clone();
        Scheduler::new(Arc::clone(&self.scan_service), scanner)
    }
}
