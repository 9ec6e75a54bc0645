//! The synchronization engine: filesystem snapshots, diffing, and catalog
//! reconciliation. Nothing here knows about scan lifecycles.

pub mod diff;
pub mod fs;
pub mod reconcile;
pub mod snapshot;
pub mod whitelist;

pub use diff::{ChangeKind, ChangeRecord, ChangeSummary, diff};
pub use fs::{FileSystem, LocalFileSystem};
pub use reconcile::{CatalogError, MediaCatalog, Reconciler};
pub use snapshot::{Snapshot, SnapshotError, probe_root};
pub use whitelist::ExtensionWhitelist;
