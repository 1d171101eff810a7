//! Types for the status update orchestrator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::config::OrchestratorConfig;

/// Default transport timeout requested for one status check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that abort a batch run. Individual shipment failures never do.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A per-shipment task panicked or was aborted.
    #[error("status update task failed: {0}")]
    TaskFailed(String),

    /// A background run was requested while another is in progress.
    #[error("a status update run is already in progress")]
    AlreadyRunning,
}

/// Options for a single status check.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    /// Bypass the eligibility filter.
    pub force: bool,
    /// Transport timeout requested for the call.
    pub timeout: Duration,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            force: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Snapshot handed to the progress callback before each batch is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    /// 1-based index of the batch about to run.
    pub current_batch: usize,
}

/// Callback invoked before each batch.
pub type ProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Options for a batch run.
#[derive(Clone)]
pub struct BatchOptions {
    /// Shipments checked concurrently per batch. Zero is treated as one.
    pub max_concurrent: usize,
    /// Bypass the eligibility filter, terminal statuses included.
    pub force: bool,
    pub on_progress: Option<ProgressCallback>,
    /// Extra attempts for a failed shipment.
    pub retry_failed_attempts: u32,
    /// Transport timeout requested for each call.
    pub timeout: Duration,
}

impl BatchOptions {
    /// Defaults taken from the orchestrator configuration.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            retry_failed_attempts: config.retry_failed_attempts,
            ..Default::default()
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub(crate) fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            force: self.force,
            timeout: self.timeout,
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            force: false,
            on_progress: None,
            retry_failed_attempts: 1,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOptions")
            .field("max_concurrent", &self.max_concurrent)
            .field("force", &self.force)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<callback>"))
            .field("retry_failed_attempts", &self.retry_failed_attempts)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A failed shipment, as listed in progress and batch outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateError {
    pub shipment_id: String,
    /// Human-facing shipment identifier, if the record has one.
    pub shipment_number: Option<String>,
    pub error: String,
}

/// Progress of the current batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProgress {
    pub total: usize,
    pub completed: usize,
    /// Display id of the first shipment in the batch being processed.
    pub current: Option<String>,
    pub errors: Vec<UpdateError>,
}

impl UpdateProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }
}

/// Outcome of one shipment's status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateResult {
    /// The backend checked the shipment.
    Updated {
        shipment_id: String,
        previous_status: Option<String>,
        new_status: Option<String>,
        status_changed: bool,
        tracking_updates_count: u32,
    },
    /// Not attempted; never retried and never counted as a failure.
    Skipped { shipment_id: String, reason: String },
    /// The check failed after all attempts.
    Failed { shipment_id: String, error: String },
}

impl UpdateResult {
    pub fn shipment_id(&self) -> &str {
        match self {
            UpdateResult::Updated { shipment_id, .. }
            | UpdateResult::Skipped { shipment_id, .. }
            | UpdateResult::Failed { shipment_id, .. } => shipment_id,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, UpdateResult::Updated { .. })
    }

    pub fn skipped(&self) -> bool {
        matches!(self, UpdateResult::Skipped { .. })
    }

    /// A hard failure: not successful and not skipped.
    pub fn failed(&self) -> bool {
        matches!(self, UpdateResult::Failed { .. })
    }

    pub fn status_changed(&self) -> bool {
        matches!(
            self,
            UpdateResult::Updated {
                status_changed: true,
                ..
            }
        )
    }

    /// Error message of a hard failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            UpdateResult::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpdateResult::Updated { .. } => "updated",
            UpdateResult::Skipped { .. } => "skipped",
            UpdateResult::Failed { .. } => "failed",
        }
    }
}

/// Returned by a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    /// False only when the run was aborted by an orchestration-level failure.
    pub success: bool,
    pub results: HashMap<String, UpdateResult>,
    pub errors: Vec<UpdateError>,
    pub total_processed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Counts derived from the results map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub status_changed: usize,
    pub has_results: bool,
}

impl UpdateStats {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a UpdateResult>) -> Self {
        let mut stats = Self::default();
        for result in results {
            match result {
                UpdateResult::Updated { status_changed, .. } => {
                    stats.successful += 1;
                    if *status_changed {
                        stats.status_changed += 1;
                    }
                }
                UpdateResult::Skipped { .. } => stats.skipped += 1,
                UpdateResult::Failed { .. } => stats.failed += 1,
            }
        }
        stats.total = stats.successful + stats.failed + stats.skipped;
        stats.has_results = stats.total > 0;
        stats
    }
}
