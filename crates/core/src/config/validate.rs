use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Status-check URL is an http(s) URL and the timeout is non-zero
/// - Orchestrator batch size is non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let url = config.status_check.functions_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "status_check.functions_url must be an http(s) URL, got {:?}",
            config.status_check.functions_url
        )));
    }

    if config.status_check.function_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "status_check.function_name cannot be empty".to_string(),
        ));
    }

    if config.status_check.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "status_check.timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, StatusCheckConfig};
    use crate::orchestrator::OrchestratorConfig;
    use std::net::IpAddr;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig::default(),
            status_check: StatusCheckConfig {
                functions_url: "https://functions.example.com".to_string(),
                function_name: "checkShipmentStatus".to_string(),
                timeout_ms: 30_000,
            },
            orchestrator: OrchestratorConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..valid_config()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = valid_config();
        config.status_check.functions_url = "ftp://functions.example.com".to_string();
        assert!(validate_config(&config).is_err());

        config.status_check.functions_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.status_check.timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = valid_config();
        config.orchestrator.max_concurrent = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_concurrent"));
    }
}
