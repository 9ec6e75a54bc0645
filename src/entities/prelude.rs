pub use super::media::Entity as Media;
pub use super::scans::Entity as Scans;
pub use super::sources::Entity as Sources;
