//! Configuration management

use crate::error::{DdrpError, DdrpResult, ErrorContext};
use crate::logging::LoggingConfig;
use crate::types::{ApiConfig, DdrpConfig, SessionSettings};

use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://ddrp-be.onrender.com";

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: 30,
            user_agent: format!("ddrp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_path: "~/.ddrp/session.json".to_string(),
            expiry_check_interval_secs: 60,
        }
    }
}

impl Default for DdrpConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SessionSettings {
    /// Storage path with a leading `~/` expanded to the home directory
    pub fn resolved_storage_path(&self) -> PathBuf {
        expand_home(&self.storage_path)
    }
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    expand_home("~/.ddrp/config.toml")
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

impl DdrpConfig {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DdrpResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DdrpError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DdrpConfig = toml::from_str(&content).map_err(|e| DdrpError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load from `path` (or the default location), fall back to defaults when
    /// no file exists, then apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> DdrpResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);

        let mut config = if path.exists() {
            debug!("Loading configuration from {}", path.display());
            Self::from_file(&path)?
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DdrpResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DdrpError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| DdrpError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Override settings from `DDRP_API_URL`, `DDRP_SESSION_FILE` and
    /// `DDRP_EXPIRY_CHECK_SECS`
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DDRP_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(path) = std::env::var("DDRP_SESSION_FILE") {
            self.session.storage_path = path;
        }
        if let Some(secs) = std::env::var("DDRP_EXPIRY_CHECK_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.session.expiry_check_interval_secs = secs;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> DdrpResult<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| DdrpError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute http(s) URL such as http://localhost:8000"),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DdrpError::Config {
                message: format!("Unsupported URL scheme: {}", url.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use an http or https URL"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(DdrpError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        if self.session.expiry_check_interval_secs == 0 {
            return Err(DdrpError::Config {
                message: "session.expiry_check_interval_secs must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.expiry_check_interval_secs to a positive value"),
            });
        }

        if self.session.storage_path.trim().is_empty() {
            return Err(DdrpError::Config {
                message: "session.storage_path must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}
