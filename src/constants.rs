pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "opus", "m4a", "aac", "wav", "wma", "alac", "aiff",
];

pub const APP_DIR_NAME: &str = "shelfsync";

pub mod intervals {

    pub const DEFAULT_AUTO_SCAN_MINUTES: u32 = 60;
}

pub mod limits {

    /// Deepest directory level the snapshot walk descends into.
    pub const MAX_WALK_DEPTH: usize = 64;

    pub const DEFAULT_HISTORY_LIMIT: u64 = 10;
}
