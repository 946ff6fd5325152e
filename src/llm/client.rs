//! Retrying client for the report model.
//!
//! Wraps one `generateContent`-style POST with bounded exponential backoff.
//! Transport and sleeper are injected so the retry policy runs without a
//! network or a real clock in tests.

use super::error::{ApiError, AttemptError};
use super::transport::{Sleeper, Transport};
use crate::models::ReportRequest;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attempts made when the caller does not say otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Backoff before the next attempt: `2^attempt` seconds, where `attempt`
/// counts retryable failures so far starting at 1.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Build the JSON body for a report request.
pub fn request_payload(request: &ReportRequest) -> Value {
    json!({
        "contents": [{"parts": [{"text": request.user_prompt}]}],
        "systemInstruction": {"parts": [{"text": request.system_instruction}]},
    })
}

/// Pull the generated text out of a response body, if there is any.
pub fn extract_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|text| !text.trim().is_empty())
}

/// Client that retries rate limits, server errors and transport failures.
pub struct RetryingClient {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    endpoint: String,
    max_retries: u32,
}

impl RetryingClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        endpoint: impl Into<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            sleeper,
            endpoint: endpoint.into(),
            max_retries,
        }
    }

    /// Endpoint used by [`RetryingClient::generate`].
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the report request to the configured endpoint.
    pub async fn generate(&self, request: &ReportRequest) -> Result<String, ApiError> {
        let payload = request_payload(request);
        self.call(&self.endpoint, &payload, self.max_retries).await
    }

    /// POST `payload` to `endpoint`, making at most `max_retries` attempts.
    ///
    /// Returns the generated text on success. A response without text and a
    /// non-retryable status end the call at once; retryable failures are
    /// retried after [`backoff_delay`] until the budget is spent.
    pub async fn call(
        &self,
        endpoint: &str,
        payload: &Value,
        max_retries: u32,
    ) -> Result<String, ApiError> {
        let max_attempts = max_retries.max(1);
        let mut attempt = 0;

        loop {
            let err = match self.attempt(endpoint, payload).await {
                Ok(text) => {
                    info!(attempts = attempt + 1, "Report model responded");
                    return Ok(text);
                }
                Err(err) => err,
            };

            let classification = err.classify();
            if !classification.retryable {
                warn!(
                    error_type = classification.error_type,
                    error = %err,
                    "Non-retryable error, failing immediately"
                );
                return Err(err.into_terminal(max_attempts));
            }

            attempt += 1;
            if attempt >= max_attempts {
                warn!(
                    attempts = attempt,
                    error = %err,
                    "Max retries exhausted"
                );
                return Err(ApiError::RetriesExhausted(max_attempts));
            }

            let delay = backoff_delay(attempt);
            warn!(
                attempt,
                max = max_attempts,
                error_type = classification.error_type,
                delay_secs = delay.as_secs(),
                error = %err,
                "Retrying after error"
            );
            self.sleeper.sleep(delay).await;
        }
    }

    async fn attempt(&self, endpoint: &str, payload: &Value) -> Result<String, AttemptError> {
        let response = self.transport.post_json(endpoint, payload).await?;

        if !response.is_success() {
            debug!("Error body: {}", response.body);
            return Err(AttemptError::Status(response.status));
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                warn!("Response body is not JSON: {}", e);
                return Err(AttemptError::EmptyResponse);
            }
        };

        match extract_text(&body) {
            Some(text) => Ok(text.to_string()),
            None => {
                warn!("Received unexpected/empty response from API: {}", body);
                Err(AttemptError::EmptyResponse)
            }
        }
    }
}
