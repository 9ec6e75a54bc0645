//! `SeaORM` implementation of the `ScanService` trait.
//!
//! Starting a scan takes an in-process claim on the source and then checks
//! for a running row and inserts the new one inside a single transaction.
//! The claim is held until the row is finalized and released on every exit
//! path.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{ScanBegin, ScanCompletion, Store};
use crate::domain::events::NotificationEvent;
use crate::domain::{ProcessClock, ScanId, SingleFlightPolicy, SourceId};
use crate::library::{ChangeSummary, FileSystem, Reconciler, Snapshot, diff, probe_root};
use crate::models::scan::{ChangeCounts, Scan, ScanState};
use crate::models::source::Source;
use crate::services::scan_service::{ScanAllEntry, ScanError, ScanService};

type ClaimSet = Arc<Mutex<HashSet<SourceId>>>;

/// Marks a source as being scanned by this process until dropped.
struct Claim {
    claims: ClaimSet,
    source_id: SourceId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.source_id);
    }
}

/// A scan row that has been inserted but not yet executed.
struct StartedScan {
    source: Source,
    scan: Scan,
    claim: Claim,
}

pub struct SeaOrmScanService {
    store: Store,
    fs: Arc<dyn FileSystem>,
    config: Arc<RwLock<Config>>,
    clock: ProcessClock,
    claims: ClaimSet,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmScanService {
    #[must_use]
    pub fn new(
        store: Store,
        fs: Arc<dyn FileSystem>,
        config: Arc<RwLock<Config>>,
        clock: ProcessClock,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            fs,
            config,
            clock,
            claims: Arc::new(Mutex::new(HashSet::new())),
            event_bus,
        }
    }

    fn try_claim(&self, source_id: SourceId, policy: SingleFlightPolicy) -> Option<Claim> {
        let mut held = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        let blocked = if policy.is_global() {
            !held.is_empty()
        } else {
            held.contains(&source_id)
        };
        if blocked {
            return None;
        }
        held.insert(source_id);
        drop(held);

        Some(Claim {
            claims: Arc::clone(&self.claims),
            source_id,
        })
    }

    async fn check_root(&self, source: &Source) -> Result<(), ScanError> {
        let fs = Arc::clone(&self.fs);
        let root = source.root_path.clone();
        tokio::task::spawn_blocking(move || probe_root(fs.as_ref(), &root).map(|_| ()))
            .await
            .map_err(|e| ScanError::Internal(format!("root check panicked: {e}")))??;
        Ok(())
    }

    async fn start(&self, source_id: SourceId) -> Result<StartedScan, ScanError> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .ok_or(ScanError::SourceNotFound(source_id))?;

        self.check_root(&source).await?;

        let policy = self.config.read().await.scanner.single_flight;
        let claim = self
            .try_claim(source_id, policy)
            .ok_or(ScanError::AlreadyRunning(source_id))?;

        let scan = match self
            .store
            .begin_scan_exclusive(source_id, policy, self.clock.process_started_at())
            .await?
        {
            ScanBegin::Started(scan) => scan,
            ScanBegin::Blocked(running) => {
                info!(
                    source_id = %source_id,
                    running_scan_id = %running.id,
                    running_source_id = %running.source_id,
                    "Scan refused, another scan is running"
                );
                return Err(ScanError::AlreadyRunning(source_id));
            }
        };

        info!(
            event = "scan_started",
            source_id = %source_id,
            scan_id = %scan.id,
            root = %source.root_path.display(),
            "Scan started"
        );
        let _ = self.event_bus.send(NotificationEvent::ScanStarted {
            source_id,
            scan_id: scan.id,
        });

        Ok(StartedScan {
            source,
            scan,
            claim,
        })
    }

    /// Executes a started scan and finalizes its row whatever the outcome.
    async fn run(&self, started: StartedScan) -> Result<Scan, ScanError> {
        let StartedScan {
            source,
            mut scan,
            claim,
        } = started;
        let start = Instant::now();

        let mut counts = ChangeCounts::default();
        let outcome = self.execute(&source, &mut counts).await;

        let completion = ScanCompletion {
            ended_at: Utc::now(),
            counts,
            error: outcome.as_ref().err().map(ToString::to_string),
        };
        let finalized = self.store.finalize_scan(scan.id, completion.clone()).await;
        drop(claim);

        match finalized {
            Ok(true) => {}
            Ok(false) => warn!(scan_id = %scan.id, "Scan row was already finalized"),
            Err(e) => {
                error!(scan_id = %scan.id, error = %e, "Failed to finalize scan row");
                return Err(outcome.err().unwrap_or_else(|| e.into()));
            }
        }

        scan.ended_at = Some(completion.ended_at);
        scan.changes_added = Some(counts.added);
        scan.changes_removed = Some(counts.removed);
        scan.error.clone_from(&completion.error);

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => {
                info!(
                    event = "scan_finished",
                    source_id = %source.id,
                    scan_id = %scan.id,
                    added = counts.added,
                    removed = counts.removed,
                    duration_ms,
                    "Scan finished"
                );
                let _ = self.event_bus.send(NotificationEvent::ScanFinished {
                    source_id: source.id,
                    scan_id: scan.id,
                    added: counts.added,
                    removed: counts.removed,
                });
                Ok(scan)
            }
            Err(e) => {
                error!(
                    event = "scan_failed",
                    source_id = %source.id,
                    scan_id = %scan.id,
                    added = counts.added,
                    removed = counts.removed,
                    duration_ms,
                    error = %e,
                    "Scan failed"
                );
                let _ = self.event_bus.send(NotificationEvent::ScanFailed {
                    source_id: source.id,
                    scan_id: scan.id,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(&self, source: &Source, counts: &mut ChangeCounts) -> Result<(), ScanError> {
        let reconciler = Reconciler::new(&self.store);

        reconciler
            .prune_unreachable(source.id, Arc::clone(&self.fs), counts)
            .await?;

        let records = self.store.list_media_for_source(source.id).await?;
        let catalog =
            Snapshot::from_catalog(source.root(), records.iter().map(|r| r.path.as_str()));

        let whitelist = self.config.read().await.whitelist();
        let fs = Arc::clone(&self.fs);
        let root: PathBuf = source.root_path.clone();
        let current =
            tokio::task::spawn_blocking(move || Snapshot::build(fs.as_ref(), &root, &whitelist))
                .await
                .map_err(|e| ScanError::Internal(format!("directory walk panicked: {e}")))??;

        let changes = diff(&catalog, &current);
        let summary = ChangeSummary::of(&changes);
        info!(
            source_id = %source.id,
            catalogued = catalog.file_count(),
            on_disk = current.file_count(),
            to_add = summary.added,
            to_remove = summary.removed,
            "Computed changeset"
        );
        if summary.is_empty() {
            return Ok(());
        }

        reconciler.apply(source, &changes, counts).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ScanService for SeaOrmScanService {
    async fn scan_source(&self, source_id: SourceId) -> Result<Scan, ScanError> {
        let started = self.start(source_id).await?;
        self.run(started).await
    }

    async fn spawn_scan(self: Arc<Self>, source_id: SourceId) -> Result<Scan, ScanError> {
        let started = self.start(source_id).await?;
        let scan = started.scan.clone();

        tokio::spawn(async move {
            // Failures are logged and recorded on the row by `run`.
            let _ = self.run(started).await;
        });

        Ok(scan)
    }

    async fn scan_all(&self) -> Result<Vec<ScanAllEntry>, ScanError> {
        let sources = self.store.list_sources().await?;
        let mut entries = Vec::with_capacity(sources.len());

        for source in sources {
            let entry = match self.scan_source(source.id).await {
                Ok(scan) => ScanAllEntry {
                    source_id: source.id,
                    scan: Some(scan),
                    error: None,
                },
                Err(e) => {
                    warn!(source_id = %source.id, name = %source.name, error = %e, "Scan of source failed");
                    ScanAllEntry {
                        source_id: source.id,
                        scan: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            entries.push(entry);
        }

        Ok(entries)
    }

    async fn scan_history(
        &self,
        source_id: SourceId,
        limit: Option<u64>,
    ) -> Result<Vec<Scan>, ScanError> {
        if self.store.get_source(source_id).await?.is_none() {
            return Err(ScanError::SourceNotFound(source_id));
        }
        Ok(self.store.scan_history(source_id, limit).await?)
    }

    async fn scan_underway(
        &self,
        source_id: Option<SourceId>,
    ) -> Result<Option<SourceId>, ScanError> {
        let process_started_at = self.clock.process_started_at();
        let open = self.store.list_open_scans(source_id).await?;

        Ok(open
            .into_iter()
            .find(|scan| scan.is_running(process_started_at))
            .map(|scan| scan.source_id))
    }

    async fn get_scan(&self, scan_id: ScanId) -> Result<Option<Scan>, ScanError> {
        Ok(self.store.get_scan(scan_id).await?)
    }

    fn scan_state(&self, scan: &Scan) -> ScanState {
        scan.state(self.clock.process_started_at())
    }
}
