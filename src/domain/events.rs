//! Domain events for the application.
//!
//! Scan lifecycle events are broadcast on the event bus so the CLI, the
//! scheduler, or any future API layer can observe completion without polling.

use serde::Serialize;

use super::{ScanId, SourceId};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    SourceAdded {
        source_id: SourceId,
        name: String,
    },
    SourceRemoved {
        source_id: SourceId,
    },

    ScanStarted {
        source_id: SourceId,
        scan_id: ScanId,
    },
    ScanFinished {
        source_id: SourceId,
        scan_id: ScanId,
        added: i32,
        removed: i32,
    },
    ScanFailed {
        source_id: SourceId,
        scan_id: ScanId,
        message: String,
    },
}
