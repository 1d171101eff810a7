//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the status update orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Default number of shipments checked concurrently per batch.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Default number of extra attempts for a failed shipment.
    /// Skipped shipments are never retried.
    #[serde(default = "default_retry_failed_attempts")]
    pub retry_failed_attempts: u32,

    /// Fixed delay between attempts for one shipment (milliseconds).
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Delay between consecutive batches (milliseconds).
    /// Keeps bursts from overwhelming the backend.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
}

fn default_max_concurrent() -> usize {
    3
}

fn default_retry_failed_attempts() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    1000 // 1 second
}

fn default_batch_delay() -> u64 {
    500
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            retry_failed_attempts: default_retry_failed_attempts(),
            retry_delay_ms: default_retry_delay(),
            batch_delay_ms: default_batch_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.retry_failed_attempts, 1);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.batch_delay_ms, 500);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.retry_delay_ms, 1000);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            max_concurrent = 8
            retry_failed_attempts = 0
            retry_delay_ms = 250
            batch_delay_ms = 0
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.retry_failed_attempts, 0);
        assert_eq!(config.retry_delay_ms, 250);
        assert_eq!(config.batch_delay_ms, 0);
    }
}
