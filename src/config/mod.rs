//! Configuration module for the purge service.
//!
//! The service is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8710
//!
//! [platform]
//! base_url = "https://shop.example.com"
//! consumer_key = "${WC_CONSUMER_KEY}"
//! consumer_secret = "${WC_CONSUMER_SECRET}"
//!
//! [[auth.operator_keys]]
//! name = "ops"
//! key = "${CLEAROUT_OPERATOR_KEY}"
//! capabilities = ["purge:run", "purge:read"]
//! ```

mod auth;
mod database;
mod observability;
mod platform;
mod purge;
mod server;

use std::path::Path;

pub use auth::*;
pub use database::*;
pub use observability::*;
pub use platform::*;
pub use purge::*;
use serde::{Deserialize, Serialize};
pub use server::*;

/// Root configuration for the purge service.
///
/// All sections are optional with defaults, except that purging anything
/// real requires a `[platform]` section; without one the service starts in
/// setup mode and every purge endpoint reports the platform as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearoutConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Operator authentication and capabilities.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Job-state persistence. If omitted, job state lives in memory and a
    /// restart abandons the job (local mode).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Commerce platform connection. Absent means setup mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformConfig>,

    /// Purge protocol tuning.
    #[serde(default)]
    pub purge: PurgeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl ClearoutConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: ClearoutConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.purge.validate()?;
        if let Some(platform) = &self.platform {
            platform.validate()?;
        }
        Ok(())
    }

    /// Whether the service runs without persistent job state.
    pub fn is_local_mode(&self) -> bool {
        self.database.is_none()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR_NAME}` references from the environment, skipping any that
/// appear after a `#` comment marker on the line.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let whole = cap.get(0).unwrap();
            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
