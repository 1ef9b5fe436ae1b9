use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Operator authentication configuration.
///
/// The service does not manage identities itself; it answers one question
/// per request — is this caller allowed — against a static list of bearer
/// keys with capability grants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Bearer keys accepted on operator endpoints.
    /// With no keys configured, every purge endpoint is rejected.
    #[serde(default)]
    pub operator_keys: Vec<OperatorKeyConfig>,
}

/// One operator bearer key and its capability grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorKeyConfig {
    /// Display name used in logs; never the key itself.
    pub name: String,

    /// The bearer key value. Use `${VAR}` interpolation rather than
    /// committing keys to the config file.
    pub key: String,

    /// Granted capabilities, e.g. `purge:run`, `purge:read`.
    pub capabilities: Vec<String>,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in &self.operator_keys {
            if key.name.is_empty() {
                return Err(ConfigError::Validation(
                    "Operator key name cannot be empty".into(),
                ));
            }
            if key.key.len() < 16 {
                return Err(ConfigError::Validation(format!(
                    "Operator key '{}' must be at least 16 characters",
                    key.name
                )));
            }
            if key.capabilities.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Operator key '{}' grants no capabilities",
                    key.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_key_is_rejected() {
        let config = AuthConfig {
            operator_keys: vec![OperatorKeyConfig {
                name: "ops".into(),
                key: "short".into(),
                capabilities: vec!["purge:run".into()],
            }],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_without_capabilities_is_rejected() {
        let config = AuthConfig {
            operator_keys: vec![OperatorKeyConfig {
                name: "ops".into(),
                key: "op_1234567890abcdef".into(),
                capabilities: vec![],
            }],
        };
        assert!(config.validate().is_err());
    }
}
