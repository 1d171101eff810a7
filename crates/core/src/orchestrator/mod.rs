//! Status update orchestrator.
//!
//! Classifies shipments, filters out ineligible ones and drives remote status
//! checks in bounded batches:
//! - **Batches**: up to `max_concurrent` checks run concurrently; batches run in order
//! - **Retries**: failed checks are retried with a fixed delay, skips never are
//! - **Cancellation**: cooperative; in-flight calls are left to finish

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{SpawnedBatch, StatusUpdateOrchestrator, BATCH_ERROR_ID};
pub use types::{
    BatchOptions, BatchOutcome, BatchProgress, OrchestratorError, ProgressCallback, UpdateError,
    UpdateOptions, UpdateProgress, UpdateResult, UpdateStats, DEFAULT_TIMEOUT,
};
