use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind to.
    /// Default: 127.0.0.1 (the service is an operator tool, not public)
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL, used to build continuation triggers.
    /// Defaults to `http://{host}:{port}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// Base URL for continuation triggers, without a trailing slash.
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8710
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://127.0.0.1:8710");
    }

    #[test]
    fn test_public_url_overrides_and_trims() {
        let config = ServerConfig {
            public_url: Some("https://purge.internal.example.com/".into()),
            ..Default::default()
        };
        assert_eq!(
            config.public_base_url(),
            "https://purge.internal.example.com"
        );
    }
}
