use crate::domain::{MediaId, SourceId};
use serde::{Deserialize, Serialize};

/// The catalog's record of one file reachable under a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: MediaId,
    pub source_id: SourceId,
    pub path: String,
    pub mime_type: Option<String>,
    pub added_at: String,
}

/// A media record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedia {
    pub source_id: SourceId,
    pub path: String,
    pub mime_type: Option<String>,
}

impl NewMedia {
    /// Builds an insert for `path`, guessing the MIME type from its extension.
    #[must_use]
    pub fn guess(source_id: SourceId, path: String) -> Self {
        let mime_type = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            source_id,
            path,
            mime_type,
        }
    }
}
