use crate::domain::SourceId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A registered root directory kept in sync with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub root_path: PathBuf,
    pub owner_id: i32,
    pub created_at: String,
}

impl Source {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Whether the two roots would count the same files twice.
    ///
    /// Comparison is component-wise, so `/music` does not overlap `/music2`.
    #[must_use]
    pub fn overlaps(&self, other: &Path) -> bool {
        paths_overlap(&self.root_path, other)
    }
}

fn paths_overlap(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
