//! Status checker backed by an HTTPS callable cloud function.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StatusCheckConfig;

use super::{
    StatusCheckError, StatusCheckReply, StatusCheckRequest, StatusCheckResponse, StatusChecker,
};

/// Callable request envelope.
#[derive(Serialize)]
struct CallableRequest<'a> {
    data: &'a StatusCheckRequest,
}

/// Callable response envelope.
#[derive(Deserialize)]
struct CallableResponse {
    #[serde(default)]
    result: Option<StatusCheckReply>,
    #[serde(default)]
    error: Option<CallableError>,
}

#[derive(Deserialize)]
struct CallableErrorBody {
    error: CallableError,
}

#[derive(Debug, Deserialize)]
struct CallableError {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Calls the status-check function over HTTP.
pub struct HttpStatusChecker {
    client: Client,
    config: StatusCheckConfig,
}

impl HttpStatusChecker {
    /// Create a new checker with the given configuration.
    pub fn new(config: StatusCheckConfig) -> Result<Self, StatusCheckError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StatusCheckError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Full URL of the callable function.
    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.functions_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.function_name)
        )
    }
}

#[async_trait]
impl StatusChecker for HttpStatusChecker {
    fn name(&self) -> &str {
        "callable"
    }

    async fn check_status(
        &self,
        request: &StatusCheckRequest,
        timeout: Duration,
    ) -> Result<StatusCheckResponse, StatusCheckError> {
        let url = self.endpoint();
        debug!(shipment_id = %request.shipment_id, url = %url, "Calling status check");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&CallableRequest { data: request })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let err = error_from_status(status, &body);
            warn!(
                shipment_id = %request.shipment_id,
                http_status = status.as_u16(),
                "Status check returned an error: {}",
                err
            );
            return Err(err);
        }

        let envelope: CallableResponse = serde_json::from_str(&body)
            .map_err(|e| StatusCheckError::InvalidResponse(e.to_string()))?;

        match (envelope.result, envelope.error) {
            (Some(reply), _) => reply.into_result(),
            (None, Some(error)) => Err(map_callable_error(error, None)),
            (None, None) => Err(StatusCheckError::InvalidResponse(
                "missing result".to_string(),
            )),
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> StatusCheckError {
    if e.is_timeout() {
        StatusCheckError::DeadlineExceeded
    } else if e.is_connect() {
        StatusCheckError::Unavailable(e.to_string())
    } else {
        StatusCheckError::Transport(e.to_string())
    }
}

/// Map a non-2xx reply, preferring the callable error code when the body has one.
fn error_from_status(status: StatusCode, body: &str) -> StatusCheckError {
    match serde_json::from_str::<CallableErrorBody>(body) {
        Ok(parsed) => map_callable_error(parsed.error, Some(status)),
        Err(_) => match status {
            StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => {
                StatusCheckError::DeadlineExceeded
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                StatusCheckError::Unavailable(format!("HTTP {}", status))
            }
            _ => StatusCheckError::Remote(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )),
        },
    }
}

fn map_callable_error(error: CallableError, status: Option<StatusCode>) -> StatusCheckError {
    let message = error
        .message
        .clone()
        .or_else(|| status.map(|s| format!("HTTP {}", s)))
        .unwrap_or_else(|| "Status check failed".to_string());

    match error.status.as_deref() {
        Some("DEADLINE_EXCEEDED") => StatusCheckError::DeadlineExceeded,
        Some("UNAVAILABLE") => StatusCheckError::Unavailable(message),
        _ => match status {
            Some(StatusCode::GATEWAY_TIMEOUT) => StatusCheckError::DeadlineExceeded,
            Some(StatusCode::SERVICE_UNAVAILABLE) => StatusCheckError::Unavailable(message),
            _ => StatusCheckError::Remote(message),
        },
    }
}
