pub mod prelude;

pub mod media;
pub mod scans;
pub mod sources;
