pub mod scan_service;
pub mod scan_service_impl;
pub use scan_service::{ScanAllEntry, ScanError, ScanService};
pub use scan_service_impl::SeaOrmScanService;

pub mod source_service;
pub mod source_service_impl;
pub use source_service::{SourceError, SourceService};
pub use source_service_impl::SeaOrmSourceService;

pub mod scheduler;
pub use scheduler::Scheduler;
