//! Server configuration persistence
//!
//! The config types live in ancestral-types; this module stores them with
//! confy under the `ancestral` application name.

use std::path::PathBuf;

use ancestral_types::ServerConfig;
use tracing::warn;

use super::ConfigError;

const APP_NAME: &str = "ancestral";
const CONFIG_NAME: &str = "config";

/// Extension trait for ServerConfig persistence
pub trait ServerConfigExt: Sized {
    /// Stored config, or defaults when missing or unreadable.
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn path() -> Result<PathBuf, ConfigError>;
}

impl ServerConfigExt for ServerConfig {
    fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            warn!(error = %e, "Using default server configuration");
            Self::default()
        })
    }

    fn try_load() -> Result<Self, ConfigError> {
        confy::load(APP_NAME, CONFIG_NAME).map_err(ConfigError::Load)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn path() -> Result<PathBuf, ConfigError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).map_err(ConfigError::Locate)
    }
}
