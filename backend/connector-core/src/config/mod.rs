mod env;

pub use env::{ENV_CLIENT_NAME, ENV_HOST, ENV_LOG_LEVEL, ENV_PORT};

use crate::error::config::ConfigError;
use crate::{
    BUTTPLUG_SUBPROTOCOL, DEFAULT_CLIENT_NAME, INTIFACE_DEFAULT_HOST, INTIFACE_DEFAULT_PORT,
};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_NAME: &str = "stream-connector";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntifaceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_subprotocol")]
    pub subprotocol: String,
}

impl Default for IntifaceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_name: default_client_name(),
            subprotocol: default_subprotocol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Give up after this many seconds of consecutive failures. `None` retries forever.
    #[serde(default)]
    pub max_elapsed_secs: Option<u64>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            max_elapsed_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`. `None` keeps the build default.
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub intiface: IntifaceConfig,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            intiface: IntifaceConfig::default(),
            reconnect: ReconnectConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_host() -> String {
    INTIFACE_DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    INTIFACE_DEFAULT_PORT
}
fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}
fn default_subprotocol() -> String {
    BUTTPLUG_SUBPROTOCOL.to_string()
}
fn default_initial_interval_ms() -> u64 {
    500
}
fn default_max_interval_ms() -> u64 {
    10_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl IntifaceConfig {
    /// `ws://{host}:{port}`. Intiface Central serves on the root path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if host and port do not form a valid URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("ws://{}:{}", self.host, self.port);
        Url::parse(&raw).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid Intiface endpoint '{raw}': {e}"),
        })
    }
}

impl ConnectorConfig {
    /// `{platform config dir}/stream-connector`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DirectoryNotFound`] if the platform has no config dir.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .ok_or_else(|| ConfigError::DirectoryNotFound {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ConnectorConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json via temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation_error(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        let intiface = &self.intiface;
        if intiface.host.trim().is_empty() {
            return Err(validation_error("intiface.host cannot be empty".to_string()));
        }
        if intiface.port == 0 {
            return Err(validation_error("intiface.port cannot be 0".to_string()));
        }
        if intiface.client_name.trim().is_empty() {
            return Err(validation_error(
                "intiface.client_name cannot be empty".to_string(),
            ));
        }
        if intiface.subprotocol.trim().is_empty() {
            return Err(validation_error(
                "intiface.subprotocol cannot be empty".to_string(),
            ));
        }
        intiface.endpoint_url()?;

        let reconnect = &self.reconnect;
        if reconnect.initial_interval_ms == 0 {
            return Err(validation_error(
                "reconnect.initial_interval_ms must be greater than 0".to_string(),
            ));
        }
        if reconnect.max_interval_ms < reconnect.initial_interval_ms {
            return Err(validation_error(format!(
                "reconnect.max_interval_ms ({}) is below initial_interval_ms ({})",
                reconnect.max_interval_ms, reconnect.initial_interval_ms
            )));
        }

        self.log_level()?;

        Ok(())
    }

    /// Parsed `logging.level`, `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an unknown level name.
    pub fn log_level(&self) -> Result<Option<LevelFilter>, ConfigError> {
        self.logging
            .level
            .as_deref()
            .map(|level| {
                LevelFilter::from_str(level).map_err(|_| {
                    validation_error(format!("Invalid logging.level: {level}"))
                })
            })
            .transpose()
    }
}

#[track_caller]
fn validation_error(reason: String) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason,
    }
}
