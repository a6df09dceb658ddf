//! Coach configuration persistence
//!
//! The config type itself lives in repcoach-types; this module stores it
//! through confy under the `repcoach` app name.

use std::path::PathBuf;

use repcoach_types::CoachConfig;

use super::ConfigError;

const APP_NAME: &str = "repcoach";
const CONFIG_NAME: &str = "config";

/// Extension trait for CoachConfig persistence
pub trait CoachConfigExt: Sized {
    /// Load the stored config, falling back to defaults on any failure
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn config_path() -> Result<PathBuf, ConfigError>;
}

impl CoachConfigExt for CoachConfig {
    fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).map_err(ConfigError::Path)
    }
}
