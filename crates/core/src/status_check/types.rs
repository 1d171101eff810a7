//! Types for the remote status-check boundary.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carrier::{MasterCarrier, TrackingIdentifierKind};

/// Payload sent to the remote "check shipment status" operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheckRequest {
    pub shipment_id: String,
    pub master_carrier: MasterCarrier,
    pub tracking_identifier: TrackingIdentifierKind,
    pub tracking_value: Option<String>,
    pub force: bool,
}

/// Successful status check as reported by the backend. Taken verbatim: the
/// backend decides whether the status changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheckResponse {
    #[serde(default)]
    pub previous_status: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
    #[serde(default)]
    pub status_changed: bool,
    #[serde(default)]
    pub tracking_updates_count: u32,
}

/// Raw reply body: `{success: true, ...}` or `{success: false, error}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheckReply {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub response: StatusCheckResponse,
}

impl StatusCheckReply {
    /// Split the reply into a response or a remote-reported failure.
    pub fn into_result(self) -> Result<StatusCheckResponse, StatusCheckError> {
        if self.success {
            Ok(self.response)
        } else {
            Err(StatusCheckError::Remote(
                self.error
                    .unwrap_or_else(|| "Status check failed".to_string()),
            ))
        }
    }
}

/// Errors from a status check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusCheckError {
    /// The call exceeded its deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The backend is temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an explicit failure.
    #[error("{0}")]
    Remote(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The reply could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StatusCheckError {
    /// Stable, human-readable message for display next to a shipment.
    pub fn user_message(&self) -> String {
        match self {
            StatusCheckError::DeadlineExceeded => "Request timed out".to_string(),
            StatusCheckError::Unavailable(_) => "Service temporarily unavailable".to_string(),
            StatusCheckError::Remote(message) | StatusCheckError::Transport(message) => {
                message.clone()
            }
            StatusCheckError::InvalidResponse(_) => self.to_string(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StatusCheckError::DeadlineExceeded => "deadline_exceeded",
            StatusCheckError::Unavailable(_) => "unavailable",
            StatusCheckError::Remote(_) => "remote",
            StatusCheckError::Transport(_) => "transport",
            StatusCheckError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// The remote "check/update shipment status" operation.
#[async_trait]
pub trait StatusChecker: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Check one shipment. `timeout` is a request to the transport layer.
    async fn check_status(
        &self,
        request: &StatusCheckRequest,
        timeout: Duration,
    ) -> Result<StatusCheckResponse, StatusCheckError>;
}
