pub mod carrier;
pub mod config;
pub mod eligibility;
pub mod metrics;
pub mod orchestrator;
pub mod shipment;
pub mod status_check;
pub mod testing;

pub use carrier::{classify, CarrierInfo, DetectionConfidence, MasterCarrier, TrackingIdentifierKind};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
    StatusCheckConfig,
};
pub use eligibility::{eligible_shipments, ineligibility_reason, is_eligible};
pub use orchestrator::{
    BatchOptions, BatchOutcome, BatchProgress, OrchestratorConfig, OrchestratorError,
    SpawnedBatch, StatusUpdateOrchestrator, UpdateError, UpdateOptions, UpdateProgress,
    UpdateResult, UpdateStats,
};
pub use shipment::Shipment;
pub use status_check::{
    HttpStatusChecker, StatusCheckError, StatusCheckRequest, StatusCheckResponse, StatusChecker,
};
