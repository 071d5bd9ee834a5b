//! Environment overrides for [`ConnectorConfig`].
//!
//! Applied after the config file is loaded (and after the application has
//! loaded any `.env`), so deployments can repoint the connector without
//! editing `config.json`.

use crate::config::ConnectorConfig;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;

use log::info;

pub const ENV_HOST: &str = "STREAM_CONNECTOR_HOST";
pub const ENV_PORT: &str = "STREAM_CONNECTOR_PORT";
pub const ENV_CLIENT_NAME: &str = "STREAM_CONNECTOR_CLIENT_NAME";
pub const ENV_LOG_LEVEL: &str = "STREAM_CONNECTOR_LOG_LEVEL";

impl ConnectorConfig {
    /// Apply overrides read from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if `STREAM_CONNECTOR_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the port override is not a port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = lookup(ENV_HOST) {
            info!("{ENV_HOST} overrides intiface.host");
            self.intiface.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.intiface.port =
                port.trim()
                    .parse()
                    .map_err(|e| ConfigError::ValidationError {
                        location: ErrorLocation::from(Location::caller()),
                        reason: format!("{ENV_PORT}='{port}' is not a valid port: {e}"),
                    })?;
            info!("{ENV_PORT} overrides intiface.port");
        }

        if let Some(client_name) = lookup(ENV_CLIENT_NAME) {
            info!("{ENV_CLIENT_NAME} overrides intiface.client_name");
            self.intiface.client_name = client_name;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            info!("{ENV_LOG_LEVEL} overrides logging.level");
            self.logging.level = Some(level);
        }

        Ok(())
    }
}
