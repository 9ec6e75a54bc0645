mod history;
mod scan;
mod source;
mod status;

pub use history::cmd_history;
pub use scan::{cmd_scan, cmd_scan_all};
pub use source::{cmd_source_add, cmd_source_list, cmd_source_remove};
pub use status::cmd_status;
