//! Status update API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use shiptrack_core::{
    BatchOptions, BatchProgress, OrchestratorError, Shipment, UpdateOptions, UpdateProgress,
    UpdateResult, UpdateStats,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a single status update
#[derive(Debug, Deserialize)]
pub struct SingleUpdateBody {
    pub shipment: Shipment,
    /// Refresh even if the shipment is not eligible
    #[serde(default)]
    pub force: bool,
    /// Overrides the configured request timeout
    pub timeout_ms: Option<u64>,
}

/// Request body for a batch run
#[derive(Debug, Deserialize)]
pub struct BatchUpdateBody {
    pub shipments: Vec<Shipment>,
    pub max_concurrent: Option<usize>,
    #[serde(default)]
    pub force: bool,
    pub retry_failed_attempts: Option<u32>,
    pub timeout_ms: Option<u64>,
}

/// Response for an accepted batch run
#[derive(Debug, Serialize)]
pub struct BatchStartedResponse {
    pub run_id: Uuid,
    /// Shipments submitted, before eligibility filtering
    pub submitted: usize,
}

/// Progress of the current run
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub is_updating: bool,
    pub progress: UpdateProgress,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct StatusUpdateErrorResponse {
    pub error: String,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type ErrorReply = (StatusCode, Json<StatusUpdateErrorResponse>);

fn error_response(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(StatusUpdateErrorResponse {
            error: error.into(),
        }),
    )
}

fn request_timeout(state: &AppState, timeout_ms: Option<u64>) -> Duration {
    Duration::from_millis(timeout_ms.unwrap_or(state.config().status_check.timeout_ms))
}

impl BatchUpdateBody {
    /// Merge the body over the configured defaults.
    fn options(&self, state: &AppState) -> BatchOptions {
        let defaults = state.orchestrator().batch_options();
        BatchOptions {
            max_concurrent: self.max_concurrent.unwrap_or(defaults.max_concurrent),
            force: self.force,
            retry_failed_attempts: self
                .retry_failed_attempts
                .unwrap_or(defaults.retry_failed_attempts),
            timeout: request_timeout(state, self.timeout_ms),
            on_progress: Some(Arc::new(|p: BatchProgress| {
                debug!(
                    batch = p.current_batch,
                    completed = p.completed,
                    total = p.total,
                    "Status update batch starting"
                );
            })),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Refresh one shipment and wait for the result
pub async fn update_single(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SingleUpdateBody>,
) -> Json<UpdateResult> {
    let options = UpdateOptions {
        force: body.force,
        timeout: request_timeout(&state, body.timeout_ms),
    };
    let result = state
        .orchestrator()
        .update_single_shipment(&body.shipment, options)
        .await;
    Json(result)
}

/// Start a batch run in the background
pub async fn start_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchUpdateBody>,
) -> Result<(StatusCode, Json<BatchStartedResponse>), ErrorReply> {
    start(&state, body, false)
}

/// Re-run shipments whose last result was a failure
pub async fn retry_failed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchUpdateBody>,
) -> Result<(StatusCode, Json<BatchStartedResponse>), ErrorReply> {
    start(&state, body, true)
}

fn start(
    state: &AppState,
    body: BatchUpdateBody,
    failed_only: bool,
) -> Result<(StatusCode, Json<BatchStartedResponse>), ErrorReply> {
    if body.max_concurrent == Some(0) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "max_concurrent must be greater than 0",
        ));
    }

    let options = body.options(state);
    let submitted = body.shipments.len();
    let orchestrator = state.orchestrator();
    let spawned = if failed_only {
        orchestrator.spawn_retry_failed(body.shipments, options)
    } else {
        orchestrator.spawn_update(body.shipments, options)
    };

    match spawned {
        Ok(spawned) => {
            info!(
                run_id = %spawned.run_id,
                submitted,
                failed_only,
                "Accepted status update run"
            );
            Ok((
                StatusCode::ACCEPTED,
                Json(BatchStartedResponse {
                    run_id: spawned.run_id,
                    submitted,
                }),
            ))
        }
        Err(e @ OrchestratorError::AlreadyRunning) => {
            Err(error_response(StatusCode::CONFLICT, e.to_string()))
        }
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// Cancel the current run
pub async fn cancel(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    let was_updating = state.orchestrator().is_updating();
    state.orchestrator().cancel_updates().await;
    Json(MessageResponse {
        message: if was_updating {
            "Status updates cancelled".to_string()
        } else {
            "No status update run in progress".to_string()
        },
    })
}

/// Progress of the current run
pub async fn get_progress(State(state): State<Arc<AppState>>) -> Json<ProgressResponse> {
    let orchestrator = state.orchestrator();
    Json(ProgressResponse {
        is_updating: orchestrator.is_updating(),
        progress: orchestrator.progress().await,
    })
}

/// All recorded results, keyed by shipment id
pub async fn get_results(
    State(state): State<Arc<AppState>>,
) -> Json<HashMap<String, UpdateResult>> {
    Json(state.orchestrator().results().await)
}

/// Counts over the recorded results
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<UpdateStats> {
    Json(state.orchestrator().update_stats().await)
}

/// Drop all recorded results
pub async fn clear_results(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.orchestrator().clear_results().await;
    Json(MessageResponse {
        message: "Results cleared".to_string(),
    })
}
