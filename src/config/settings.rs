//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the POT provider.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration settings for the POT provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,
    /// Extraction configuration
    #[serde(default)]
    pub extractor: ExtractorSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Token extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    /// Seconds between scheduled token updates
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    /// Seconds to wait for the player API request within one attempt
    #[serde(default = "default_capture_timeout")]
    pub capture_timeout_secs: u64,
    /// Browser executable override; autodetected when absent
    #[serde(default)]
    pub browser_path: Option<PathBuf>,
    /// Watch page opened to trigger playback
    #[serde(default = "default_watch_url")]
    pub watch_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_update_interval() -> u64 {
    300
}

fn default_capture_timeout() -> u64 {
    30
}

fn default_watch_url() -> String {
    "https://www.youtube.com/embed/jNQXAC9IVRw".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval(),
            capture_timeout_secs: default_capture_timeout(),
            browser_path: None,
            watch_url: default_watch_url(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
        }
    }
}

impl ExtractorSettings {
    /// Interval between scheduled updates
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Bounded wait for the player API request within one attempt
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut settings = Self::default();

        if let Ok(host) = std::env::var("POTOKEN_HOST") {
            settings.server.host = host;
        }

        if let Ok(port) = std::env::var("POTOKEN_PORT") {
            settings.server.port = port
                .parse()
                .map_err(|e| crate::Error::config(format!("Invalid port: {e}")))?;
        }

        if let Ok(interval) = std::env::var("POTOKEN_UPDATE_INTERVAL") {
            settings.extractor.update_interval_secs = interval
                .parse()
                .map_err(|e| crate::Error::config(format!("Invalid update interval: {e}")))?;
        }

        if let Ok(path) = std::env::var("POTOKEN_BROWSER_PATH") {
            settings.extractor.browser_path = Some(PathBuf::from(path));
        }

        if let Ok(url) = std::env::var("POTOKEN_WATCH_URL") {
            settings.extractor.watch_url = url;
        }

        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::config(format!("Invalid config file {path:?}: {e}")))
    }

    /// Validate the final configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.extractor.update_interval_secs == 0 {
            return Err(crate::Error::config("update interval must be at least 1 second"));
        }
        if self.extractor.capture_timeout_secs == 0 {
            return Err(crate::Error::config("capture timeout must be at least 1 second"));
        }
        url::Url::parse(&self.extractor.watch_url)
            .map_err(|e| crate::Error::config(format!("Invalid watch URL: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.extractor.update_interval_secs, 300);
        assert_eq!(settings.extractor.capture_timeout_secs, 30);
        assert!(settings.extractor.browser_path.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_duration_helpers() {
        let settings = Settings::default();
        assert_eq!(settings.extractor.update_interval(), Duration::from_secs(300));
        assert_eq!(settings.extractor.capture_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_partial_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
port = 9090

[extractor]
update_interval_secs = 120
"#
        )
        .unwrap();

        let settings = Settings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.server.port, 9090);
        // Unspecified fields keep their defaults
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.extractor.update_interval_secs, 120);
        assert_eq!(settings.extractor.capture_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "not toml at all [").unwrap();

        assert!(Settings::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_env_var_override() {
        unsafe {
            std::env::set_var("POTOKEN_PORT", "9000");
            std::env::set_var("POTOKEN_UPDATE_INTERVAL", "60");
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.extractor.update_interval_secs, 60);

        unsafe {
            std::env::remove_var("POTOKEN_PORT");
            std::env::remove_var("POTOKEN_UPDATE_INTERVAL");
        }
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut settings = Settings::default();
        settings.extractor.update_interval_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_watch_url() {
        let mut settings = Settings::default();
        settings.extractor.watch_url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }
}
