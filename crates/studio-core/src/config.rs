//! Configuration management for the studio content admin

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Session storage configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Refresh timers
    #[serde(default)]
    pub polling: PollingConfig,

    /// Image upload limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `http://localhost:5000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the static-asset server that hosts uploaded images
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the session file
    #[serde(default = "default_session_directory")]
    pub directory: PathBuf,
}

/// Refresh timer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Bookings list refresh interval in seconds
    #[serde(default = "default_bookings_secs")]
    pub bookings_secs: u64,

    /// Contacts list refresh interval in seconds
    #[serde(default = "default_contacts_secs")]
    pub contacts_secs: u64,

    /// Dashboard refresh interval in seconds (only while visible)
    #[serde(default = "default_dashboard_secs")]
    pub dashboard_secs: u64,
}

/// Image upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Client-side size cap applied before uploading, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_asset_base_url() -> String {
    "http://localhost:5000".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_session_directory() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".studio"),
        |home| PathBuf::from(home).join(".studio"),
    )
}

const fn default_bookings_secs() -> u64 {
    30
}

const fn default_contacts_secs() -> u64 {
    30
}

const fn default_dashboard_secs() -> u64 {
    60
}

const fn default_max_image_bytes() -> u64 {
    2 * 1024 * 1024 // 2MB
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            asset_base_url: default_asset_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: default_session_directory(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            bookings_secs: default_bookings_secs(),
            contacts_secs: default_contacts_secs(),
            dashboard_secs: default_dashboard_secs(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PollingConfig {
    /// Bookings refresh interval
    #[must_use]
    pub const fn bookings_interval(&self) -> Duration {
        Duration::from_secs(self.bookings_secs)
    }

    /// Contacts refresh interval
    #[must_use]
    pub const fn contacts_interval(&self) -> Duration {
        Duration::from_secs(self.contacts_secs)
    }

    /// Dashboard refresh interval
    #[must_use]
    pub const fn dashboard_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_secs)
    }
}

impl Config {
    /// Load configuration from `studio.toml` (if present) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::build(config::File::with_name("studio").required(false))
    }

    /// Load configuration from an explicit file plus the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the configuration cannot be parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("STUDIO").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as a `studio.toml` document
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if a value has no TOML form.
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Configuration {
            message: format!("Failed to serialize configuration: {e}"),
        })
    }

    /// Check values that serde cannot reject on its own
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] for unusable values.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(crate::Error::Configuration {
                message: format!("api.base_url must be an http(s) URL, got '{}'", self.api.base_url),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(crate::Error::Configuration {
                message: "api.timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.polling.bookings_secs == 0
            || self.polling.contacts_secs == 0
            || self.polling.dashboard_secs == 0
        {
            return Err(crate::Error::Configuration {
                message: "polling intervals must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_rendered_toml_loads_back() {
        let mut config = Config::default();
        config.api.base_url = "https://studio.example/api".to_string();
        config.polling.dashboard_secs = 15;

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[polling]"));

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(rendered.as_bytes()).unwrap();
        let loaded = Config::load_from(file.path()).unwrap();

        assert_eq!(loaded.api.base_url, "https://studio.example/api");
        assert_eq!(loaded.polling.dashboard_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.asset_base_url, "http://localhost:5000");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));

        assert_eq!(config.polling.bookings_interval(), Duration::from_secs(30));
        assert_eq!(config.polling.contacts_interval(), Duration::from_secs(30));
        assert_eq!(config.polling.dashboard_interval(), Duration::from_secs(60));

        assert_eq!(config.upload.max_image_bytes, 2_097_152);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.logging.file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json_str = r#"{
            "api": {"base_url": "https://cms.example.com/api"},
            "polling": {"dashboard_secs": 120}
        }"#;

        let config: Config = serde_json::from_str(json_str).unwrap();

        assert_eq!(config.api.base_url, "https://cms.example.com/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.polling.dashboard_secs, 120);
        assert_eq!(config.polling.bookings_secs, 30);
        assert_eq!(config.upload.max_image_bytes, 2_097_152);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.api.base_url = "localhost:5000".to_string();
        assert!(matches!(
            config.validate(),
            Err(crate::Error::Configuration { .. })
        ));

        let mut config = Config::default();
        config.polling.contacts_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://admin.example.org/api\"\ntimeout_secs = 3\n\n[upload]\nmax_image_bytes = 1024"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://admin.example.org/api");
        assert_eq!(config.api.timeout_secs, 3);
        assert_eq!(config.upload.max_image_bytes, 1024);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
    }
}
