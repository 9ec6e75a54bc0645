use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{APP_DIR_NAME, DEFAULT_EXTENSIONS, intervals};
use crate::domain::SingleFlightPolicy;
use crate::library::ExtensionWhitelist;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub library: LibraryConfig,

    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `"pretty"` or `"json"`
    pub log_format: String,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/shelfsync.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// File extensions that count as media, without the leading dot.
    pub extensions: Vec<String>,

    pub follow_links: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub single_flight: SingleFlightPolicy,

    pub auto_scan: bool,

    pub auto_scan_interval_minutes: u32,

    /// Takes precedence over the interval when set.
    pub cron_expression: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            single_flight: SingleFlightPolicy::default(),
            auto_scan: true,
            auto_scan_interval_minutes: intervals::DEFAULT_AUTO_SCAN_MINUTES,
            cron_expression: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR_NAME).join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_DIR_NAME}")).join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.whitelist().is_empty() {
            anyhow::bail!("library.extensions must name at least one extension");
        }

        if self.scanner.auto_scan
            && self.scanner.auto_scan_interval_minutes == 0
            && self.scanner.cron_expression.is_none()
        {
            anyhow::bail!("Auto-scan interval must be > 0 or cron expression must be set");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }

    #[must_use]
    pub fn whitelist(&self) -> ExtensionWhitelist {
        ExtensionWhitelist::new(&self.library.extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scanner.auto_scan_interval_minutes, 60);
        assert_eq!(config.scanner.single_flight, SingleFlightPolicy::PerSource);
        assert!(config.library.extensions.iter().any(|e| e == "flac"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[library]"));
        assert!(toml_str.contains("[scanner]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"
            log_format = "JSON"

            [library]
            extensions = [".MP3", "ogg"]

            [scanner]
            single_flight = "global"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(config.general.json_logs());
        assert_eq!(config.scanner.single_flight, SingleFlightPolicy::Global);
        assert!(config.whitelist().matches("song.mp3"));
        assert!(!config.whitelist().matches("song.flac"));

        assert_eq!(config.general.max_db_connections, 5);
    }

    #[test]
    fn test_validate_rejects_empty_whitelist() {
        let mut config = Config::default();
        config.library.extensions = vec![" . ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_scheduler_needs_interval_or_cron() {
        let mut config = Config::default();
        config.scanner.auto_scan_interval_minutes = 0;
        assert!(config.validate().is_err());

        config.scanner.cron_expression = Some("0 0 * * * *".to_string());
        assert!(config.validate().is_ok());

        config.scanner.cron_expression = None;
        config.scanner.auto_scan = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.library.follow_links = true;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert!(loaded.library.follow_links);
    }
}
