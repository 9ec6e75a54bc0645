//! Domain service for registering and removing library sources.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::SourceId;
use crate::models::source::Source;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source not found: {0}")]
    NotFound(SourceId),

    #[error("Root {} overlaps source {} ({})", .requested.display(), .existing.id, .existing.root_path.display())]
    PathOverlap {
        requested: PathBuf,
        existing: Box<Source>,
    },

    #[error("Path is not an accessible directory: {}: {message}", .path.display())]
    PathInaccessible { path: PathBuf, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Source {0} has a scan in progress")]
    ScanInProgress(SourceId),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for SourceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SourceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait SourceService: Send + Sync {
    /// Registers a directory tree as a source.
    ///
    /// The root is canonicalized first, so two spellings of one directory
    /// are detected as overlapping.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Validation`] if `name` is blank.
    /// - [`SourceError::PathInaccessible`] if the root does not resolve to a
    ///   readable directory.
    /// - [`SourceError::PathOverlap`] if the root is an ancestor or descendant
    ///   of an existing source root, or equal to one.
    async fn add_source(
        &self,
        name: &str,
        root_path: &Path,
        owner_id: i32,
    ) -> Result<Source, SourceError>;

    async fn list_sources(&self) -> Result<Vec<Source>, SourceError>;

    async fn get_source(&self, id: SourceId) -> Result<Source, SourceError>;

    /// Deletes a source with its media records and scan history.
    ///
    /// # Errors
    ///
    /// - [`SourceError::NotFound`] if the source does not exist.
    /// - [`SourceError::ScanInProgress`] while a scan of it is running.
    async fn remove_source(&self, id: SourceId) -> Result<(), SourceError>;
}
