use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub status_check: StatusCheckConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Remote status-check function configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusCheckConfig {
    /// Base URL of the callable functions (e.g., "https://us-central1-acme.cloudfunctions.net")
    pub functions_url: String,
    /// Name of the status-check function
    #[serde(default = "default_function_name")]
    pub function_name: String,
    /// Default per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_function_name() -> String {
    "checkShipmentStatus".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[status_check]
functions_url = "https://functions.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.status_check.function_name, "checkShipmentStatus");
        assert_eq!(config.status_check.timeout_ms, 30_000);
        assert_eq!(config.orchestrator.max_concurrent, 3);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[status_check]
functions_url = "http://localhost:5001/demo/us-central1"
function_name = "refreshShipment"
timeout_ms = 5000

[orchestrator]
max_concurrent = 5
retry_failed_attempts = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.status_check.functions_url,
            "http://localhost:5001/demo/us-central1"
        );
        assert_eq!(config.status_check.function_name, "refreshShipment");
        assert_eq!(config.status_check.timeout_ms, 5000);
        assert_eq!(config.orchestrator.max_concurrent, 5);
        assert_eq!(config.orchestrator.retry_failed_attempts, 2);
        assert_eq!(config.orchestrator.retry_delay_ms, 1000);
    }

    #[test]
    fn test_deserialize_missing_status_check_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
