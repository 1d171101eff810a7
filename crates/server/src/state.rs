use std::sync::Arc;
use shiptrack_core::{Config, StatusUpdateOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<StatusUpdateOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<StatusUpdateOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<StatusUpdateOrchestrator> {
        &self.orchestrator
    }
}
