use std::collections::BTreeSet;
use std::path::Path;

/// Lowercase file extensions (without the leading dot) admitted into a snapshot.
///
/// ```rust
/// use shelfsync::library::ExtensionWhitelist;
///
/// let whitelist = ExtensionWhitelist::new([".MP3", "flac"]);
/// assert!(whitelist.matches("Track 01.mp3"));
/// assert!(whitelist.matches("live.FLAC"));
/// assert!(!whitelist.matches("cover.png"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionWhitelist(BTreeSet<String>);

impl ExtensionWhitelist {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        )
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.0.contains(&ext.to_lowercase()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_configured_extensions() {
        let whitelist = ExtensionWhitelist::new([" .Mp3 ", "", "."]);
        assert_eq!(whitelist.iter().collect::<Vec<_>>(), vec!["mp3"]);
    }

    #[test]
    fn files_without_extension_never_match() {
        let whitelist = ExtensionWhitelist::new(["mp3"]);
        assert!(!whitelist.matches("mp3"));
        assert!(!whitelist.matches("README"));
        assert!(whitelist.matches("a.b.mp3"));
    }
}
