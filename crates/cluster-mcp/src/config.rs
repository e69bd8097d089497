//! Server configuration.
//!
//! Configuration is loaded from environment variables with defaults
//! suitable for local use against the current kubeconfig context.

use serde::{Deserialize, Serialize};

/// Transport the server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// Line-delimited JSON-RPC over stdin/stdout.
    Stdio,
    /// Streamable HTTP endpoint.
    Http,
}

/// How to resolve cluster credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Require in-cluster service account credentials.
    pub in_cluster: bool,
    /// Explicit kubeconfig path. When unset, the default search chain
    /// applies (in-cluster first, then the conventional kubeconfig
    /// locations).
    pub kubeconfig: Option<String>,
}

/// Full server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Selected transport.
    pub transport: Transport,

    /// Listen address for the HTTP transport.
    pub http_addr: String,

    /// Cluster credential settings.
    pub cluster: ClusterSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            http_addr: "0.0.0.0:8080".to_string(),
            cluster: ClusterSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MCP_TRANSPORT`: `stdio` (default) or `http`
    /// - `MCP_HTTP_ADDR`: HTTP listen address (default: 0.0.0.0:8080)
    /// - `KUBECONFIG`: explicit credential file path
    /// - `IN_CLUSTER`: `true` to require in-cluster credentials
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            transport: std::env::var("MCP_TRANSPORT")
                .map(|value| parse_transport(&value))
                .unwrap_or(default.transport),
            http_addr: std::env::var("MCP_HTTP_ADDR").unwrap_or(default.http_addr),
            cluster: ClusterSettings {
                in_cluster: std::env::var("IN_CLUSTER")
                    .map(|value| parse_bool(&value))
                    .unwrap_or(false),
                kubeconfig: std::env::var("KUBECONFIG").ok().filter(|p| !p.is_empty()),
            },
        }
    }
}

fn parse_transport(value: &str) -> Transport {
    match value.to_ascii_lowercase().as_str() {
        "http" => Transport::Http,
        _ => Transport::Stdio,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert!(!config.cluster.in_cluster);
        assert!(config.cluster.kubeconfig.is_none());
    }

    #[test]
    fn test_parse_transport() {
        assert_eq!(parse_transport("http"), Transport::Http);
        assert_eq!(parse_transport("HTTP"), Transport::Http);
        assert_eq!(parse_transport("stdio"), Transport::Stdio);
        assert_eq!(parse_transport("garbage"), Transport::Stdio);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
