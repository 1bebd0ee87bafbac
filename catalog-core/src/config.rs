//! Configuration management

use crate::error::{CatalogError, CatalogResult};
use crate::types::{ApiConfig, CatalogConfig, CatalogSettings, RemoteMode, SessionConfig};

use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "CATALOG_API_URL";
/// Environment variable overriding `api.mode`
pub const REMOTE_MODE_ENV: &str = "CATALOG_REMOTE_MODE";

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:4000/api".to_string(),
                timeout_seconds: 10,
                user_agent: format!("catalog-admin/{}", env!("CARGO_PKG_VERSION")),
                mode: RemoteMode::Http,
            },
            session: SessionConfig {
                storage_path: "~/.catalog-admin/session.json".to_string(),
            },
            catalog: CatalogSettings {
                low_stock_threshold: 20,
                serialize_mutations: true,
            },
        }
    }
}

impl CatalogConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: CatalogConfig = toml::from_str(&content).map_err(|e| CatalogError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> CatalogResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CatalogError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| CatalogError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply `CATALOG_API_URL` / `CATALOG_REMOTE_MODE` from the environment
    pub fn with_env_overrides(mut self) -> CatalogResult<Self> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }

        if let Ok(mode) = std::env::var(REMOTE_MODE_ENV) {
            self.api.mode = mode.parse().map_err(|e: String| CatalogError::Config {
                message: e,
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("env_overrides")
                    .with_suggestion("Use 'http' or 'mock'"),
            })?;
        }

        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> CatalogResult<()> {
        if self.api.mode == RemoteMode::Http {
            let parsed = url::Url::parse(&self.api.base_url).map_err(|e| CatalogError::Config {
                message: format!("api.base_url is not a valid URL: {}", e),
                source: Some(Box::new(e)),
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.base_url to e.g. http://localhost:4000/api"),
            })?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(CatalogError::Config {
                    message: format!("api.base_url must use http or https, got '{}'", parsed.scheme()),
                    source: None,
                    context: crate::ErrorContext::new("config").with_operation("validate"),
                });
            }
        }

        if self.api.timeout_seconds == 0 {
            return Err(CatalogError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value (default 10)"),
            });
        }

        if self.session.storage_path.trim().is_empty() {
            return Err(CatalogError::Config {
                message: "session.storage_path must not be empty".to_string(),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Point session.storage_path at a writable file"),
            });
        }

        Ok(())
    }

    /// Session storage path with a leading `~` expanded
    pub fn session_storage_path(&self) -> PathBuf {
        expand_home(&self.session.storage_path)
    }

    /// Request timeout in milliseconds
    pub fn timeout_ms(&self) -> u64 {
        self.api.timeout_seconds.saturating_mul(1000)
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.timeout_ms(), 10_000);
    }

    #[test]
    fn mock_mode_skips_url_check() {
        let mut config = CatalogConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.mode = RemoteMode::Mock;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/tmp/session.json"), PathBuf::from("/tmp/session.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x/session.json"), home.join("x/session.json"));
        }
    }
}
