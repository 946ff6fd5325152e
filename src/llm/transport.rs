//! Injected capabilities for the report model call: the HTTP transport and
//! the sleeper used between retries.

use super::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON POST. Implementations must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, endpoint: &str, payload: &Value)
        -> Result<HttpResponse, TransportError>;
}

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real wall-clock sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// `reqwest`-backed transport with a fixed per-attempt timeout.
///
/// The API key, when present, is sent in the `x-goog-api-key` header so it
/// never appears in a request URL or in an error built from one.
pub struct ReqwestTransport {
    client: reqwest::Client,
    api_key: Option<String>,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, api_key: Option<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            timeout,
        })
    }

    fn request(&self, endpoint: &str, payload: &Value) -> reqwest::RequestBuilder {
        let request = self.client.post(endpoint).json(payload);
        match self.api_key {
            Some(ref key) => request.header(API_KEY_HEADER, key.as_str()),
            None => request,
        }
    }

    fn transport_error(&self, err: reqwest::Error, endpoint: &str) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(format!("no response after {}s", self.timeout.as_secs()))
        } else if err.is_connect() {
            TransportError::Connect(format!("cannot reach {}", endpoint))
        } else {
            TransportError::Other(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        payload: &Value,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .request(endpoint, payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e, endpoint))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                TransportError::Other(format!("failed to read body: {}", e.without_url()))
            })?;

        debug!("POST {} -> {} ({} bytes)", endpoint, status, body.len());
        Ok(HttpResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
    }

    #[test]
    fn test_api_key_travels_in_header() {
        let transport =
            ReqwestTransport::new(Duration::from_secs(5), Some("secret-key".to_string())).unwrap();
        let request = transport
            .request("http://localhost:9/v1beta/models/m:generateContent", &serde_json::json!({}))
            .build()
            .unwrap();

        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("secret-key"));
        assert_eq!(request.headers()[API_KEY_HEADER], "secret-key");
    }

    #[test]
    fn test_no_key_no_header() {
        let transport = ReqwestTransport::new(Duration::from_secs(5), None).unwrap();
        let request = transport
            .request("http://localhost:9/generate", &serde_json::json!({}))
            .build()
            .unwrap();
        assert!(request.headers().get(API_KEY_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_failed_send_does_not_leak_key() {
        let transport =
            ReqwestTransport::new(Duration::from_secs(5), Some("secret-key".to_string())).unwrap();
        let err = transport
            .post_json("http://127.0.0.1:1/generate", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("secret-key"));
        assert!(!format!("{:?}", err).contains("secret-key"));
    }
}
