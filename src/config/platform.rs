use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Commerce platform connection.
///
/// Reads and deletes go through the platform REST API with consumer-key
/// basic auth, which keeps the adapter storage-agnostic on the platform
/// side (classic posts tables or HPOS alike).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Site base URL, e.g. `https://shop.example.com`.
    pub base_url: String,

    /// REST API consumer key.
    pub consumer_key: String,

    /// REST API consumer secret.
    pub consumer_secret: String,

    /// Per-request timeout. Each purge step issues `batch_size + 1`
    /// requests, so this bounds step latency together with batch size.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl PlatformConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Validation(format!("Invalid platform base_url: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Platform base_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.consumer_key.is_empty() || self.consumer_secret.is_empty() {
            return Err(ConfigError::Validation(
                "Platform consumer_key and consumer_secret are required".into(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    30
}
