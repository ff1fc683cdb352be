//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PBM_CLEANUP` prefix and nested values use double underscores as separators.
//! Every value has a default, so an empty environment yields a working config.
//!
//! # Example
//!
//! ```no_run
//! use pbm_cleanup::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Cleanup topic: {}", config.cleanup.topic);
//! ```

mod cleanup;
mod error;
mod logging;

pub use cleanup::CleanupConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Cleanup coordinator configuration (topic, completion timeout)
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Logging configuration (filter, output format)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PBM_CLEANUP` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PBM_CLEANUP__CLEANUP__TOPIC=...` -> `cleanup.topic = ...`
    /// - `PBM_CLEANUP__CLEANUP__COMPLETION_TIMEOUT_MS=5000` -> `cleanup.completion_timeout_ms = 5000`
    /// - `PBM_CLEANUP__LOGGING__JSON=true` -> `logging.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PBM_CLEANUP")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.cleanup.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
