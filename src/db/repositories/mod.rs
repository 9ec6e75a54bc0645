pub mod media;
pub mod scan;
pub mod source;
