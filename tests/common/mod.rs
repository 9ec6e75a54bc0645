#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use shelfsync::config::Config;
use shelfsync::db::Store;
use shelfsync::domain::{ProcessClock, ScanId, SourceId};
use shelfsync::entities::scans;
use shelfsync::library::{FileSystem, LocalFileSystem};
use shelfsync::models::source::Source;
use shelfsync::state::AppContext;
use tempfile::TempDir;

pub struct TestApp {
    pub ctx: AppContext,
    pub library: TempDir,
    _db_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Config::default(), Arc::new(LocalFileSystem::default())).await
}

pub async fn spawn_app_with(mut config: Config, fs: Arc<dyn FileSystem>) -> TestApp {
    let db_dir = tempfile::tempdir().expect("failed to create db dir");
    config.general.database_path = format!("sqlite:{}", db_dir.path().join("test.db").display());
    config.library.extensions = vec!["mp3".to_string()];

    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open store");
    let ctx = AppContext::with_parts(config, store, fs, ProcessClock::new());

    TestApp {
        ctx,
        library: tempfile::tempdir().expect("failed to create library dir"),
        _db_dir: db_dir,
    }
}

impl TestApp {
    pub fn path(&self, relative: &str) -> PathBuf {
        self.library.path().join(relative)
    }

    /// Creates `relative` (and its parents) below the library root.
    pub fn touch(&self, relative: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent");
        }
        std::fs::write(&path, b"data").expect("failed to write file");
    }

    pub async fn add_source(&self, dir: &str) -> Source {
        let root = self.path(dir);
        std::fs::create_dir_all(&root).expect("failed to create source root");
        self.ctx
            .source_service
            .add_source(dir, &root, 1)
            .await
            .expect("failed to add source")
    }

    pub async fn add_library_source(&self) -> Source {
        self.ctx
            .source_service
            .add_source("library", self.library.path(), 1)
            .await
            .expect("failed to add source")
    }

    pub async fn media_paths(&self, source_id: SourceId) -> Vec<String> {
        self.ctx
            .store
            .list_media_for_source(source_id)
            .await
            .expect("failed to list media")
            .into_iter()
            .map(|m| m.path)
            .collect()
    }

    /// Writes an open scan row as if a scan had started at `started_at`.
    pub async fn insert_open_scan(&self, source_id: SourceId, started_at: DateTime<Utc>) -> ScanId {
        let model = scans::ActiveModel {
            source_id: Set(source_id.value()),
            started_at: Set(started_at.to_rfc3339()),
            ended_at: Set(None),
            changes_added: Set(None),
            changes_removed: Set(None),
            error: Set(None),
            ..Default::default()
        }
        .insert(&self.ctx.store.conn)
        .await
        .expect("failed to insert scan row");
        ScanId::new(model.id)
    }
}

pub fn under(root: &Path, relative: &str) -> String {
    root.join(relative).to_string_lossy().to_string()
}
