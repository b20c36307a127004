//! # Configuration Management for ParseHaus
//!
//! This crate provides the configuration structures shared by all ParseHaus
//! components: how to reach the remote object server and the defaults models
//! are built with.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{AppConfig, ModelConfig, ServerConfig};
//!
//! let server = ServerConfig::new(
//!     "my-app-id".to_string(),
//!     Some("rest-key".to_string()),
//!     None,
//!     "https://parse.example.com".to_string(),
//!     "parse".to_string(),
//! );
//! assert_eq!(server.base_url(), "https://parse.example.com/parse/");
//!
//! let config = AppConfig::new(server, ModelConfig::new(false));
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [server]
//! app_id = "my-app-id"
//! rest_key = "rest-key"
//! master_key = "master-key"
//! server_url = "https://parse.example.com"
//! mount_path = "parse"
//! timeout_seconds = 30
//!
//! [model]
//! default_use_master_key = false
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from the path in PARSEHAUS_CONFIG, or ./parsehaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./parsehaus.toml";
const CONFIG_PATH_VAR: &str = "PARSEHAUS_CONFIG";
const DEFAULT_MOUNT_PATH: &str = "parse";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// Remote object server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub app_id: String,
    #[serde(default)]
    pub rest_key: Option<String>,
    #[serde(default)]
    pub master_key: Option<String>,
    pub server_url: String,
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Defaults applied to every model context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub default_use_master_key: bool,
}

fn default_mount_path() -> String {
    DEFAULT_MOUNT_PATH.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl AppConfig {
    pub fn new(server: ServerConfig, model: ModelConfig) -> Self {
        Self { server, model }
    }

    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = {
            // A missing .env file is fine, a broken one is not
            if let Err(err) = dotenvy::dotenv() {
                if !err.not_found() {
                    return Err(err.into());
                }
            }

            if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
                Self::from_file(&config_path)
            } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
                Self::from_file(DEFAULT_CONFIG_PATH)
            } else {
                Err(ConfigError::Invalid(format!(
                    "Config path must be specified in .env file as {} or in {} file",
                    CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
                )))
            }
        }?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()
    }
}

impl ServerConfig {
    /// Create a new server configuration with the default timeout
    pub fn new(
        app_id: String,
        rest_key: Option<String>,
        master_key: Option<String>,
        server_url: String,
        mount_path: String,
    ) -> Self {
        Self {
            app_id,
            rest_key,
            master_key,
            server_url,
            mount_path,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Server URL without trailing slash, followed by the mount path wrapped in
    /// single slashes
    pub fn base_url(&self) -> String {
        let server = self.server_url.trim_end_matches('/');
        let mount = self.mount_path.trim_matches('/');
        if mount.is_empty() {
            format!("{}/", server)
        } else {
            format!("{}/{}/", server, mount)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Server app_id cannot be empty".to_string(),
            ));
        }
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Server server_url cannot be empty".to_string(),
            ));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "Server server_url must start with http:// or https://, got '{}'",
                self.server_url
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Server timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl ModelConfig {
    /// Create a new model configuration
    pub fn new(default_use_master_key: bool) -> Self {
        Self {
            default_use_master_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        app_id = "app"
        master_key = "master"
        server_url = "https://parse.example.com/"

        [model]
        default_use_master_key = true
    "#;

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.server.mount_path, "parse");
        assert_eq!(config.server.timeout_seconds, 30);
        assert!(config.server.rest_key.is_none());
        assert!(config.model.default_use_master_key);
    }

    #[test]
    fn test_base_url_normalization() {
        let mut server = ServerConfig::new(
            "app".to_string(),
            None,
            None,
            "http://localhost:1337//".to_string(),
            "/parse/".to_string(),
        );
        assert_eq!(server.base_url(), "http://localhost:1337/parse/");

        server.mount_path = "/".to_string();
        assert_eq!(server.base_url(), "http://localhost:1337/");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let server = ServerConfig::new(
            "".to_string(),
            None,
            None,
            "https://x".to_string(),
            "parse".to_string(),
        );
        assert!(matches!(server.validate(), Err(ConfigError::Invalid(_))));

        let server = ServerConfig::new(
            "app".to_string(),
            None,
            None,
            "ftp://x".to_string(),
            "parse".to_string(),
        );
        assert!(server.validate().is_err());

        let server = ServerConfig::new(
            "app".to_string(),
            None,
            None,
            "https://x".to_string(),
            "parse".to_string(),
        )
        .with_timeout(0);
        assert!(server.validate().is_err());
    }

    #[test]
    fn test_model_section_is_optional() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            app_id = "app"
            server_url = "https://parse.example.com"
            "#,
        )
        .unwrap();
        assert!(!config.model.default_use_master_key);
    }
}
