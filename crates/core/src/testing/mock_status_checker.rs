//! Mock status checker for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::status_check::{
    StatusCheckError, StatusCheckRequest, StatusCheckResponse, StatusChecker,
};

/// A recorded status check for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCheck {
    /// The request that was sent.
    pub request: StatusCheckRequest,
    /// Timeout requested by the caller.
    pub timeout: Duration,
    /// When the call was made.
    pub timestamp: Instant,
}

/// Mock implementation of the StatusChecker trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable responses, per shipment or by default
/// - Fail a shipment a fixed number of times, or fail the next call
/// - Delay calls and panic on chosen shipments
/// - Track requests and peak concurrency for assertions
///
/// # Example
///
/// ```rust,ignore
/// use shiptrack_core::testing::{MockStatusChecker, fixtures};
///
/// let checker = MockStatusChecker::new();
/// checker.set_response("s1", fixtures::changed_response("booked", "in_transit")).await;
/// checker.fail_times("s2", 1, StatusCheckError::DeadlineExceeded).await;
///
/// // Run the orchestrator...
///
/// assert_eq!(checker.calls_for("s2").await, 2);
/// ```
#[derive(Debug)]
pub struct MockStatusChecker {
    /// Response for shipments without a specific one.
    default_response: Arc<RwLock<StatusCheckResponse>>,
    /// Responses by shipment id.
    responses: Arc<RwLock<HashMap<String, StatusCheckResponse>>>,
    /// Remaining failures by shipment id.
    failures: Arc<RwLock<HashMap<String, (u32, StatusCheckError)>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<StatusCheckError>>>,
    /// Delay applied to every call.
    delay: Arc<RwLock<Duration>>,
    /// Delays by shipment id, overriding `delay`.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Shipments whose check panics.
    panics: Arc<RwLock<HashSet<String>>>,
    /// Recorded calls.
    checks: Arc<RwLock<Vec<RecordedCheck>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockStatusChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStatusChecker {
    /// Create a mock that reports every shipment as unchanged.
    pub fn new() -> Self {
        Self {
            default_response: Arc::new(RwLock::new(StatusCheckResponse {
                previous_status: Some("in_transit".to_string()),
                new_status: Some("in_transit".to_string()),
                status_changed: false,
                tracking_updates_count: 0,
            })),
            responses: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            delays: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(HashSet::new())),
            checks: Arc::new(RwLock::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub async fn set_default_response(&self, response: StatusCheckResponse) {
        *self.default_response.write().await = response;
    }

    pub async fn set_response(&self, shipment_id: &str, response: StatusCheckResponse) {
        self.responses
            .write()
            .await
            .insert(shipment_id.to_string(), response);
    }

    /// Fail the next `times` checks of a shipment, then succeed.
    pub async fn fail_times(&self, shipment_id: &str, times: u32, error: StatusCheckError) {
        self.failures
            .write()
            .await
            .insert(shipment_id.to_string(), (times, error));
    }

    /// Fail every check of a shipment.
    pub async fn fail_always(&self, shipment_id: &str, error: StatusCheckError) {
        self.fail_times(shipment_id, u32::MAX, error).await;
    }

    /// Fail the next call, whatever shipment it is for.
    pub async fn set_next_error(&self, error: StatusCheckError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn set_delay_for(&self, shipment_id: &str, delay: Duration) {
        self.delays
            .write()
            .await
            .insert(shipment_id.to_string(), delay);
    }

    /// Panic when checking this shipment.
    pub async fn panic_on(&self, shipment_id: &str) {
        self.panics.write().await.insert(shipment_id.to_string());
    }

    /// All recorded calls in call order.
    pub async fn recorded_checks(&self) -> Vec<RecordedCheck> {
        self.checks.read().await.clone()
    }

    /// All recorded requests in call order.
    pub async fn recorded_requests(&self) -> Vec<StatusCheckRequest> {
        self.checks
            .read()
            .await
            .iter()
            .map(|c| c.request.clone())
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.checks.read().await.len()
    }

    /// Number of calls made for one shipment.
    pub async fn calls_for(&self, shipment_id: &str) -> usize {
        self.checks
            .read()
            .await
            .iter()
            .filter(|c| c.request.shipment_id == shipment_id)
            .count()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn outcome(
        &self,
        request: &StatusCheckRequest,
    ) -> Result<StatusCheckResponse, StatusCheckError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        {
            let mut failures = self.failures.write().await;
            if let Some((remaining, error)) = failures.get_mut(&request.shipment_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(error.clone());
                }
            }
        }

        if let Some(response) = self.responses.read().await.get(&request.shipment_id) {
            return Ok(response.clone());
        }
        Ok(self.default_response.read().await.clone())
    }
}

/// Decrements the in-flight counter even when the call panics.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusChecker for MockStatusChecker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn check_status(
        &self,
        request: &StatusCheckRequest,
        timeout: Duration,
    ) -> Result<StatusCheckResponse, StatusCheckError> {
        self.checks.write().await.push(RecordedCheck {
            request: request.clone(),
            timeout,
            timestamp: Instant::now(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = match self.delays.read().await.get(&request.shipment_id) {
            Some(delay) => *delay,
            None => *self.delay.read().await,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.read().await.contains(&request.shipment_id) {
            panic!("mock status checker panic for {}", request.shipment_id);
        }

        self.outcome(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::{MasterCarrier, TrackingIdentifierKind};

    fn request(id: &str) -> StatusCheckRequest {
        StatusCheckRequest {
            shipment_id: id.to_string(),
            master_carrier: MasterCarrier::Unknown,
            tracking_identifier: TrackingIdentifierKind::TrackingNumber,
            tracking_value: Some("T1".to_string()),
            force: false,
        }
    }

    #[tokio::test]
    async fn test_fail_times_then_succeed() {
        let checker = MockStatusChecker::new();
        checker
            .fail_times("a", 2, StatusCheckError::DeadlineExceeded)
            .await;

        let timeout = Duration::from_secs(1);
        assert!(checker.check_status(&request("a"), timeout).await.is_err());
        assert!(checker.check_status(&request("a"), timeout).await.is_err());
        assert!(checker.check_status(&request("a"), timeout).await.is_ok());
        assert_eq!(checker.calls_for("a").await, 3);
        assert_eq!(checker.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let checker = MockStatusChecker::new();
        checker
            .set_next_error(StatusCheckError::Remote("boom".to_string()))
            .await;

        let timeout = Duration::from_secs(1);
        assert_eq!(
            checker.check_status(&request("a"), timeout).await,
            Err(StatusCheckError::Remote("boom".to_string()))
        );
        assert!(checker.check_status(&request("a"), timeout).await.is_ok());
    }
}
