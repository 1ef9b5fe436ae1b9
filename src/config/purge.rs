use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Purge protocol tuning.
///
/// Batch size is the sole throughput control: each step deletes at most
/// one batch, sized to fit comfortably inside the host's wall-clock budget
/// for a single invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurgeConfig {
    /// Entities processed per step. Fixed at job creation.
    /// Default: 200
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Continuation token lifetime in hours. Must span the longest purge
    /// you expect to run; hours, not minutes.
    /// Default: 12
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// Order statuses included in the purge.
    /// Default: ["any"] (every recognized status)
    #[serde(default = "default_order_statuses")]
    pub order_statuses: Vec<String>,

    /// Account roles targeted by the purge.
    /// Default: ["customer", "subscriber"]
    #[serde(default = "default_account_roles")]
    pub account_roles: Vec<String>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            token_ttl_hours: default_token_ttl_hours(),
            order_statuses: default_order_statuses(),
            account_roles: default_account_roles(),
        }
    }
}

impl PurgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "purge.batch_size must be positive".into(),
            ));
        }
        if self.token_ttl_hours == 0 {
            return Err(ConfigError::Validation(
                "purge.token_ttl_hours must be positive".into(),
            ));
        }
        if self.order_statuses.is_empty() {
            return Err(ConfigError::Validation(
                "purge.order_statuses cannot be empty".into(),
            ));
        }
        if self.account_roles.is_empty() {
            return Err(ConfigError::Validation(
                "purge.account_roles cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_batch_size() -> u32 {
    200
}

fn default_token_ttl_hours() -> u64 {
    12
}

fn default_order_statuses() -> Vec<String> {
    vec!["any".to_string()]
}

fn default_account_roles() -> Vec<String> {
    vec!["customer".to_string(), "subscriber".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PurgeConfig::default();
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.token_ttl_hours, 12);
        assert_eq!(config.order_statuses, vec!["any"]);
        assert_eq!(config.account_roles, vec!["customer", "subscriber"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_roles_are_rejected() {
        let config = PurgeConfig {
            account_roles: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
