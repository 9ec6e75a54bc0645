use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::ScannerConfig;
use crate::services::ScanService;

/// Periodically scans every source.
pub struct Scheduler {
    scans: Arc<dyn ScanService>,
    config: ScannerConfig,
    running: Arc<RwLock<bool>>,
}

async fn scan_all_job(scans: &dyn ScanService) {
    let start = Instant::now();
    info!(event = "job_started", job_name = "scan_all", "Starting scheduled scan");

    match scans.scan_all().await {
        Ok(entries) => {
            let failed = entries.iter().filter(|e| e.error.is_some()).count();
            info!(
                event = "job_finished",
                job_name = "scan_all",
                sources = entries.len(),
                failed,
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Scheduled scan finished"
            );
        }
        Err(e) => {
            error!(event = "job_failed", job_name = "scan_all", error = %e, "Scheduled scan failed");
        }
    }
}

impl Scheduler {
    pub fn new(scans: Arc<dyn ScanService>, config: ScannerConfig) -> Self {
        Self {
            scans,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.auto_scan {
            info!("Automatic scanning is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let scans = Arc::clone(&self.scans);
        let running = Arc::clone(&self.running);
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let scans = Arc::clone(&scans);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                scan_all_job(scans.as_ref()).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        while *self.running.read().await {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.auto_scan_interval_minutes.max(1);
        info!("Scheduler running every {} minutes", interval_mins);

        let mut scan_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            scan_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            scan_all_job(self.scans.as_ref()).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScanId, SourceId};
    use crate::models::scan::{Scan, ScanState};
    use crate::services::{ScanAllEntry, ScanError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingScans {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ScanService for CountingScans {
        async fn scan_source(&self, id: SourceId) -> Result<Scan, ScanError> {
            Err(ScanError::SourceNotFound(id))
        }

        async fn spawn_scan(self: Arc<Self>, id: SourceId) -> Result<Scan, ScanError> {
            Err(ScanError::SourceNotFound(id))
        }

        async fn scan_all(&self) -> Result<Vec<ScanAllEntry>, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn scan_history(
            &self,
            _id: SourceId,
            _limit: Option<u64>,
        ) -> Result<Vec<Scan>, ScanError> {
            Ok(Vec::new())
        }

        async fn scan_underway(
            &self,
            _id: Option<SourceId>,
        ) -> Result<Option<SourceId>, ScanError> {
            Ok(None)
        }

        async fn get_scan(&self, _id: ScanId) -> Result<Option<Scan>, ScanError> {
            Ok(None)
        }

        fn scan_state(&self, _scan: &Scan) -> ScanState {
            ScanState::Running
        }
    }

    #[tokio::test]
    async fn disabled_scheduler_returns_immediately() {
        let scans = Arc::new(CountingScans::default());
        let config = ScannerConfig {
            auto_scan: false,
            ..ScannerConfig::default()
        };
        let scheduler = Scheduler::new(scans.clone(), config);

        scheduler.start().await.unwrap();
        assert!(!scheduler.is_running().await);
        assert_eq!(scans.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cron_scheduler_runs_until_stopped() {
        let scans = Arc::new(CountingScans::default());
        let config = ScannerConfig {
            cron_expression: Some("* * * * * *".to_string()),
            ..ScannerConfig::default()
        };
        let scheduler = Arc::new(Scheduler::new(scans.clone(), config));

        let handle = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.start().await })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.stop().await;
        handle.await.unwrap().unwrap();

        assert!(scans.calls.load(Ordering::SeqCst) >= 1);
    }
}
