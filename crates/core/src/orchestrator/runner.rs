//! Status update orchestrator implementation.
//!
//! Runs remote status checks for shipments:
//! - Single: one shipment, recorded immediately
//! - Batch: fixed-size batches, concurrent inside a batch, sequential across batches
//! - Cancellation: cooperative, checked between batches and between retry attempts

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::carrier::classify;
use crate::eligibility::{is_eligible, NOT_ELIGIBLE_REASON};
use crate::metrics;
use crate::shipment::{non_empty, Shipment};
use crate::status_check::{StatusCheckRequest, StatusChecker};

use super::config::OrchestratorConfig;
use super::types::{
    BatchOptions, BatchOutcome, BatchProgress, OrchestratorError, UpdateError, UpdateOptions,
    UpdateProgress, UpdateResult, UpdateStats,
};

/// Shipment id used for errors that are not tied to one shipment.
pub const BATCH_ERROR_ID: &str = "batch";

/// A batch run started in the background.
#[derive(Debug)]
pub struct SpawnedBatch {
    pub run_id: Uuid,
    pub handle: JoinHandle<BatchOutcome>,
}

/// State shared between the orchestrator and its per-shipment tasks.
struct Shared {
    config: OrchestratorConfig,
    checker: Arc<dyn StatusChecker>,
    is_updating: AtomicBool,
    progress: RwLock<UpdateProgress>,
    results: RwLock<HashMap<String, UpdateResult>>,
    /// Bumped by every batch start and every cancel. A run only writes
    /// shared state while the generation it started with is current.
    generation: AtomicU64,
    cancel_tx: broadcast::Sender<()>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Check one shipment without recording the result.
    async fn check_one(&self, shipment: &Shipment, options: UpdateOptions) -> UpdateResult {
        if !options.force && !is_eligible(shipment) {
            debug!(shipment_id = %shipment.id, "Skipping ineligible shipment");
            metrics::STATUS_CHECKS.with_label_values(&["skipped"]).inc();
            return UpdateResult::Skipped {
                shipment_id: shipment.id.clone(),
                reason: NOT_ELIGIBLE_REASON.to_string(),
            };
        }

        let carrier = classify(shipment);
        let request = StatusCheckRequest {
            shipment_id: shipment.id.clone(),
            master_carrier: carrier.master_carrier,
            tracking_identifier: carrier.tracking_identifier,
            tracking_value: carrier.tracking_value,
            force: options.force,
        };

        debug!(
            shipment_id = %request.shipment_id,
            carrier = %request.master_carrier,
            tracking_identifier = request.tracking_identifier.as_str(),
            checker = self.checker.name(),
            "Checking shipment status"
        );

        let start = Instant::now();
        let response = self.checker.check_status(&request, options.timeout).await;
        metrics::STATUS_CHECK_DURATION
            .with_label_values(&[request.master_carrier.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match response {
            Ok(response) => {
                metrics::STATUS_CHECKS.with_label_values(&["updated"]).inc();
                if response.status_changed {
                    metrics::STATUS_CHANGES.inc();
                    info!(
                        shipment_id = %request.shipment_id,
                        previous = ?response.previous_status,
                        new = ?response.new_status,
                        "Shipment status changed"
                    );
                }
                UpdateResult::Updated {
                    shipment_id: request.shipment_id,
                    previous_status: response.previous_status,
                    new_status: response.new_status,
                    status_changed: response.status_changed,
                    tracking_updates_count: response.tracking_updates_count,
                }
            }
            Err(e) => {
                warn!(shipment_id = %request.shipment_id, "Status check failed: {}", e);
                metrics::STATUS_CHECKS.with_label_values(&["failed"]).inc();
                metrics::STATUS_CHECK_ERRORS
                    .with_label_values(&[e.kind()])
                    .inc();
                UpdateResult::Failed {
                    shipment_id: request.shipment_id,
                    error: e.user_message(),
                }
            }
        }
    }

    /// Check one shipment, retrying hard failures with a fixed delay.
    async fn check_with_retry(
        &self,
        shipment: &Shipment,
        options: UpdateOptions,
        retries: u32,
        generation: u64,
    ) -> UpdateResult {
        let mut cancel_rx = self.cancel_tx.subscribe();
        let delay = Duration::from_millis(self.config.retry_delay_ms);

        let mut result = self.check_one(shipment, options).await;
        let mut attempt = 0;
        while result.failed() && attempt < retries {
            if !self.is_current(generation) || !wait_or_cancel(&mut cancel_rx, delay).await {
                debug!(shipment_id = %shipment.id, "Retry abandoned after cancellation");
                break;
            }
            attempt += 1;
            metrics::STATUS_CHECK_RETRIES.inc();
            warn!(
                shipment_id = %shipment.id,
                attempt,
                max_attempts = retries,
                "Retrying status check"
            );
            result = self.check_one(shipment, options).await;
        }
        result
    }

    /// Record a result, plus its progress entry when it belongs to a batch run.
    async fn record(&self, generation: u64, result: &UpdateResult, error: Option<UpdateError>) {
        {
            let mut results = self.results.write().await;
            if !self.is_current(generation) {
                return;
            }
            results.insert(result.shipment_id().to_string(), result.clone());
        }

        let mut progress = self.progress.write().await;
        if !self.is_current(generation) {
            return;
        }
        progress.completed += 1;
        if let Some(error) = error {
            progress.errors.push(error);
        }
    }

    async fn update_progress(&self, generation: u64, f: impl FnOnce(&mut UpdateProgress)) {
        let mut progress = self.progress.write().await;
        if self.is_current(generation) {
            f(&mut progress);
        }
    }
}

/// Clears `is_updating` when a run ends, unless a newer run owns the flag.
struct UpdatingGuard {
    shared: Arc<Shared>,
    generation: u64,
}

impl Drop for UpdatingGuard {
    fn drop(&mut self) {
        if self.shared.is_current(self.generation) {
            self.shared.is_updating.store(false, Ordering::SeqCst);
        }
    }
}

/// Sleep for `delay` unless a cancel arrives first. Returns false on cancel.
async fn wait_or_cancel(cancel_rx: &mut broadcast::Receiver<()>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel_rx.recv() => false,
    }
}

/// Coordinates status updates for one set of shipments.
///
/// Owns the in-progress flag, the progress snapshot and the results map.
/// One instance is shared by `Arc` across request handlers.
pub struct StatusUpdateOrchestrator {
    shared: Arc<Shared>,
}

impl StatusUpdateOrchestrator {
    /// Create a new orchestrator.
    pub fn new(config: OrchestratorConfig, checker: Arc<dyn StatusChecker>) -> Self {
        let (cancel_tx, _) = broadcast::channel(16);

        Self {
            shared: Arc::new(Shared {
                config,
                checker,
                is_updating: AtomicBool::new(false),
                progress: RwLock::new(UpdateProgress::default()),
                results: RwLock::new(HashMap::new()),
                generation: AtomicU64::new(0),
                cancel_tx,
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Default batch options from the configuration.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::from_config(&self.shared.config)
    }

    /// Check one shipment and record the result. Never fails: errors become
    /// a `Failed` result.
    pub async fn update_single_shipment(
        &self,
        shipment: &Shipment,
        options: UpdateOptions,
    ) -> UpdateResult {
        let result = self.shared.check_one(shipment, options).await;
        self.shared
            .results
            .write()
            .await
            .insert(result.shipment_id().to_string(), result.clone());
        result
    }

    /// Check a list of shipments in batches. Clears previous results.
    pub async fn update_multiple_shipments(
        &self,
        shipments: &[Shipment],
        options: BatchOptions,
    ) -> BatchOutcome {
        let generation = self.begin_run();
        self.run_batch(Uuid::new_v4(), generation, shipments.to_vec(), options, true)
            .await
    }

    /// Re-run the given shipments whose current result is a hard failure.
    /// Other results are kept.
    pub async fn retry_failed(&self, shipments: &[Shipment], options: BatchOptions) -> BatchOutcome {
        let generation = self.begin_run();
        let failed = self.failed_shipments(shipments).await;
        self.run_batch(Uuid::new_v4(), generation, failed, options, false)
            .await
    }

    /// Start `update_multiple_shipments` in the background.
    pub fn spawn_update(
        self: &Arc<Self>,
        shipments: Vec<Shipment>,
        options: BatchOptions,
    ) -> Result<SpawnedBatch, OrchestratorError> {
        self.spawn(shipments, options, false)
    }

    /// Start `retry_failed` in the background.
    pub fn spawn_retry_failed(
        self: &Arc<Self>,
        shipments: Vec<Shipment>,
        options: BatchOptions,
    ) -> Result<SpawnedBatch, OrchestratorError> {
        self.spawn(shipments, options, true)
    }

    fn spawn(
        self: &Arc<Self>,
        shipments: Vec<Shipment>,
        options: BatchOptions,
        failed_only: bool,
    ) -> Result<SpawnedBatch, OrchestratorError> {
        if self
            .shared
            .is_updating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(OrchestratorError::AlreadyRunning);
        }
        // Fixed before the task is first polled; a cancel in between retires it.
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let run_id = Uuid::new_v4();
        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let shipments = if !failed_only {
                shipments
            } else if orchestrator.shared.is_current(generation) {
                orchestrator.failed_shipments(&shipments).await
            } else {
                Vec::new()
            };
            orchestrator
                .run_batch(run_id, generation, shipments, options, !failed_only)
                .await
        });

        Ok(SpawnedBatch { run_id, handle })
    }

    /// Stop the current batch run. In-flight calls finish but their results
    /// are not recorded; no further batches or retries start.
    pub async fn cancel_updates(&self) {
        let was_updating = self.shared.is_updating.swap(false, Ordering::SeqCst);
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        // No receivers just means nothing is waiting.
        let _ = self.shared.cancel_tx.send(());
        *self.shared.progress.write().await = UpdateProgress::default();

        if was_updating {
            info!("Status updates cancelled");
        }
    }

    /// Counts over the current results map.
    pub async fn update_stats(&self) -> UpdateStats {
        UpdateStats::from_results(self.shared.results.read().await.values())
    }

    /// Drop all results and reset progress.
    pub async fn clear_results(&self) {
        self.shared.results.write().await.clear();
        *self.shared.progress.write().await = UpdateProgress::default();
    }

    pub fn is_updating(&self) -> bool {
        self.shared.is_updating.load(Ordering::SeqCst)
    }

    pub async fn progress(&self) -> UpdateProgress {
        self.shared.progress.read().await.clone()
    }

    pub async fn results(&self) -> HashMap<String, UpdateResult> {
        self.shared.results.read().await.clone()
    }

    pub async fn result_for(&self, shipment_id: &str) -> Option<UpdateResult> {
        self.shared.results.read().await.get(shipment_id).cloned()
    }

    /// Claim a new generation for a direct (non-spawned) run.
    fn begin_run(&self) -> u64 {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.is_updating.store(true, Ordering::SeqCst);
        generation
    }

    async fn failed_shipments(&self, shipments: &[Shipment]) -> Vec<Shipment> {
        let results = self.shared.results.read().await;
        let failed: HashSet<&str> = results
            .values()
            .filter(|r| r.failed())
            .map(|r| r.shipment_id())
            .collect();

        shipments
            .iter()
            .filter(|s| failed.contains(s.id.as_str()))
            .cloned()
            .collect()
    }

    async fn run_batch(
        &self,
        run_id: Uuid,
        generation: u64,
        shipments: Vec<Shipment>,
        options: BatchOptions,
        reset_results: bool,
    ) -> BatchOutcome {
        let started_at = Utc::now();
        let shared = &self.shared;
        let mut cancel_rx = shared.cancel_tx.subscribe();
        let _guard = UpdatingGuard {
            shared: Arc::clone(shared),
            generation,
        };

        // A cancel may have landed between claiming the generation and here.
        if !shared.is_current(generation) || !shared.is_updating.load(Ordering::SeqCst) {
            info!(%run_id, "Status update run cancelled before it started");
            metrics::BATCHES.with_label_values(&["cancelled"]).inc();
            return BatchOutcome {
                run_id,
                success: true,
                results: HashMap::new(),
                errors: Vec::new(),
                total_processed: 0,
                started_at,
                finished_at: Utc::now(),
            };
        }

        let to_process: Vec<Shipment> = if options.force {
            shipments
        } else {
            shipments.into_iter().filter(is_eligible).collect()
        };
        let total = to_process.len();

        if reset_results {
            let mut results = shared.results.write().await;
            if shared.is_current(generation) {
                results.clear();
            }
        }
        shared
            .update_progress(generation, |p| *p = UpdateProgress::new(total))
            .await;

        let batch_size = options.max_concurrent.max(1);
        let batch_delay = Duration::from_millis(shared.config.batch_delay_ms);
        let update_options = options.update_options();

        info!(
            %run_id,
            total,
            batch_size,
            force = options.force,
            "Starting status update run"
        );

        let mut results = HashMap::with_capacity(total);
        let mut errors = Vec::new();
        let mut completed = 0;
        let mut success = true;

        for (index, batch) in to_process.chunks(batch_size).enumerate() {
            if index > 0 && !wait_or_cancel(&mut cancel_rx, batch_delay).await {
                break;
            }
            if !shared.is_current(generation) {
                break;
            }

            let current = batch[0].display_id().to_string();
            shared
                .update_progress(generation, |p| p.current = Some(current))
                .await;
            if let Some(on_progress) = &options.on_progress {
                on_progress(BatchProgress {
                    completed,
                    total,
                    current_batch: index + 1,
                });
            }

            debug!(%run_id, batch = index + 1, size = batch.len(), "Dispatching batch");

            let mut tasks = JoinSet::new();
            for shipment in batch {
                let task_shared = Arc::clone(shared);
                let shipment = shipment.clone();
                let retries = options.retry_failed_attempts;
                tasks.spawn(async move {
                    let result = task_shared
                        .check_with_retry(&shipment, update_options, retries, generation)
                        .await;
                    (shipment, result)
                });
            }

            let mut aborted = false;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((shipment, result)) => {
                        completed += 1;
                        let error = result.error().map(|message| UpdateError {
                            shipment_id: shipment.id.clone(),
                            shipment_number: non_empty(&shipment.shipment_number)
                                .map(str::to_string),
                            error: message.to_string(),
                        });
                        shared.record(generation, &result, error.clone()).await;
                        if let Some(error) = error {
                            errors.push(error);
                        }
                        results.insert(shipment.id, result);
                    }
                    Err(e) => {
                        let err = OrchestratorError::TaskFailed(e.to_string());
                        error!(%run_id, batch = index + 1, "Batch aborted: {}", err);
                        let entry = UpdateError {
                            shipment_id: BATCH_ERROR_ID.to_string(),
                            shipment_number: None,
                            error: err.to_string(),
                        };
                        shared
                            .update_progress(generation, |p| p.errors.push(entry.clone()))
                            .await;
                        errors.push(entry);
                        success = false;
                        aborted = true;
                    }
                }
            }

            if aborted {
                break;
            }
        }

        let cancelled = !shared.is_current(generation);
        let label = if !success {
            "failed"
        } else if cancelled {
            "cancelled"
        } else {
            "completed"
        };
        metrics::BATCHES.with_label_values(&[label]).inc();

        info!(
            %run_id,
            processed = results.len(),
            failed = errors.len(),
            outcome = label,
            "Status update run finished"
        );

        BatchOutcome {
            run_id,
            success,
            total_processed: results.len(),
            results,
            errors,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_check::StatusCheckError;
    use crate::testing::{fixtures, MockStatusChecker};

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            retry_delay_ms: 10,
            batch_delay_ms: 10,
            ..Default::default()
        }
    }

    fn orchestrator(checker: Arc<MockStatusChecker>) -> StatusUpdateOrchestrator {
        StatusUpdateOrchestrator::new(fast_config(), checker)
    }

    #[tokio::test]
    async fn test_single_update_records_result() {
        let checker = Arc::new(MockStatusChecker::new());
        checker
            .set_response("s1", fixtures::changed_response("booked", "in_transit"))
            .await;
        let orch = orchestrator(checker.clone());

        let result = orch
            .update_single_shipment(&fixtures::tracked_shipment("s1"), UpdateOptions::default())
            .await;

        assert!(result.success());
        assert!(result.status_changed());
        assert_eq!(orch.result_for("s1").await, Some(result));
        assert_eq!(checker.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_single_update_skips_ineligible_without_call() {
        let checker = Arc::new(MockStatusChecker::new());
        let orch = orchestrator(checker.clone());
        let mut shipment = fixtures::tracked_shipment("s2");
        shipment.status = Some("delivered".to_string());

        let result = orch
            .update_single_shipment(&shipment, UpdateOptions::default())
            .await;

        assert_eq!(
            result,
            UpdateResult::Skipped {
                shipment_id: "s2".to_string(),
                reason: NOT_ELIGIBLE_REASON.to_string(),
            }
        );
        assert_eq!(checker.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_single_update_force_sends_flag() {
        let checker = Arc::new(MockStatusChecker::new());
        let orch = orchestrator(checker.clone());
        let mut shipment = fixtures::tracked_shipment("s3");
        shipment.status = Some("Delivered".to_string());

        let result = orch
            .update_single_shipment(
                &shipment,
                UpdateOptions {
                    force: true,
                    ..Default::default()
                },
            )
            .await;

        assert!(result.success());
        let requests = checker.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].force);
    }

    #[tokio::test]
    async fn test_single_update_maps_errors() {
        let checker = Arc::new(MockStatusChecker::new());
        checker.set_next_error(StatusCheckError::DeadlineExceeded).await;
        let orch = orchestrator(checker);

        let result = orch
            .update_single_shipment(&fixtures::tracked_shipment("s4"), UpdateOptions::default())
            .await;

        assert_eq!(result.error(), Some("Request timed out"));
    }

    #[tokio::test]
    async fn test_batch_filters_ineligible() {
        let checker = Arc::new(MockStatusChecker::new());
        let orch = orchestrator(checker.clone());
        let mut delivered = fixtures::tracked_shipment("done");
        delivered.status = Some("delivered".to_string());
        let shipments = vec![fixtures::tracked_shipment("a"), delivered];

        let outcome = orch
            .update_multiple_shipments(&shipments, orch.batch_options())
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.total_processed, 1);
        assert!(outcome.results.contains_key("a"));
        assert!(!outcome.results.contains_key("done"));
        assert_eq!(orch.progress().await.total, 1);
        assert!(!orch.is_updating());
    }

    #[tokio::test]
    async fn test_batch_clears_previous_results() {
        let checker = Arc::new(MockStatusChecker::new());
        let orch = orchestrator(checker);
        orch.update_single_shipment(&fixtures::tracked_shipment("old"), UpdateOptions::default())
            .await;

        orch.update_multiple_shipments(&[fixtures::tracked_shipment("new")], orch.batch_options())
            .await;

        let results = orch.results().await;
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("new"));
    }

    #[tokio::test]
    async fn test_retry_failed_keeps_other_results() {
        let checker = Arc::new(MockStatusChecker::new());
        checker
            .fail_times("bad", 2, StatusCheckError::Remote("carrier down".to_string()))
            .await;
        let orch = orchestrator(checker.clone());
        let shipments = vec![
            fixtures::tracked_shipment("good"),
            fixtures::tracked_shipment("bad"),
        ];

        let first = orch
            .update_multiple_shipments(&shipments, orch.batch_options())
            .await;
        assert_eq!(first.errors.len(), 1);
        assert_eq!(first.errors[0].error, "carrier down");

        let second = orch.retry_failed(&shipments, orch.batch_options()).await;
        assert_eq!(second.total_processed, 1);
        assert!(second.results["bad"].success());

        let stats = orch.update_stats().await;
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_spawn_rejects_second_run() {
        let checker = Arc::new(MockStatusChecker::new());
        checker.set_delay(Duration::from_millis(100)).await;
        let orch = Arc::new(orchestrator(checker));

        let first = orch
            .spawn_update(vec![fixtures::tracked_shipment("a")], orch.batch_options())
            .unwrap();
        let second = orch.spawn_update(vec![fixtures::tracked_shipment("b")], orch.batch_options());
        assert!(matches!(second, Err(OrchestratorError::AlreadyRunning)));

        let outcome = first.handle.await.unwrap();
        assert_eq!(outcome.run_id, first.run_id);
        assert!(!orch.is_updating());
    }

    #[tokio::test]
    async fn test_clear_results() {
        let checker = Arc::new(MockStatusChecker::new());
        let orch = orchestrator(checker);
        orch.update_single_shipment(&fixtures::tracked_shipment("a"), UpdateOptions::default())
            .await;

        orch.clear_results().await;

        assert!(!orch.update_stats().await.has_results);
        assert_eq!(orch.progress().await, UpdateProgress::default());
    }
}
