//! HTTP-backed collaborators.
//!
//! Each adapter talks JSON to a small model-serving endpoint. None of them
//! retries; a failed call surfaces as [`CollaboratorError::Http`].

use super::{Annotator, CollaboratorError, Compressor, Embedder, RawAnnotation};
use crate::models::AspectSentiment;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

fn build_client(endpoint: &str, timeout: Duration) -> Result<reqwest::Client, CollaboratorError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CollaboratorError::Http {
            endpoint: endpoint.to_string(),
            message: format!("failed to create HTTP client: {}", e),
        })
}

async fn post_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    endpoint: &str,
    payload: &Value,
) -> Result<T, CollaboratorError> {
    let http_error = |message: String| CollaboratorError::Http {
        endpoint: endpoint.to_string(),
        message,
    };

    let response = client.post(endpoint).json(payload).send().await.map_err(|e| {
        if e.is_timeout() {
            http_error("request timed out".to_string())
        } else if e.is_connect() {
            http_error("connection failed".to_string())
        } else {
            http_error(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(http_error(format!("HTTP {}: {}", status.as_u16(), body.trim())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| http_error(format!("failed to read body: {}", e)))?;
    debug!("POST {} -> {} bytes", endpoint, body.len());

    serde_json::from_str(&body).map_err(|e| CollaboratorError::Format {
        origin: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Sends the whole batch of reviews to an aspect extraction service.
pub struct HttpAnnotator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnnotator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let endpoint = endpoint.into();
        let client = build_client(&endpoint, timeout)?;
        Ok(Self { client, endpoint })
    }
}

/// Check that the service answered once per review and convert the answers.
fn align_annotations(
    raw: Vec<RawAnnotation>,
    expected: usize,
    origin: &str,
) -> Result<Vec<Vec<AspectSentiment>>, CollaboratorError> {
    if raw.len() != expected {
        return Err(CollaboratorError::Format {
            origin: origin.to_string(),
            message: format!("got {} annotations for {} reviews", raw.len(), expected),
        });
    }
    Ok(raw.into_iter().map(RawAnnotation::into_aspects).collect())
}

#[async_trait]
impl Annotator for HttpAnnotator {
    async fn annotate(
        &self,
        reviews: &[String],
    ) -> Result<Vec<Vec<AspectSentiment>>, CollaboratorError> {
        let payload = json!({ "reviews": reviews });
        let raw: Vec<RawAnnotation> = post_json(&self.client, &self.endpoint, &payload).await?;
        align_annotations(raw, reviews.len(), &self.endpoint)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeds a short text through a sentence-embedding service.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let endpoint = endpoint.into();
        let client = build_client(&endpoint, timeout)?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        let payload = json!({ "input": text });
        let response: EmbeddingResponse = post_json(&self.client, &self.endpoint, &payload).await?;
        if response.embedding.is_empty() {
            return Err(CollaboratorError::Format {
                origin: self.endpoint.clone(),
                message: "empty embedding".to_string(),
            });
        }
        Ok(response.embedding)
    }
}

#[derive(Debug, Deserialize)]
struct SummaryText {
    summary_text: String,
}

/// Summarization services answer with a single object or a one-element list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SummaryResponse {
    Single(SummaryText),
    Batch(Vec<SummaryText>),
}

impl SummaryResponse {
    fn into_text(self) -> Option<String> {
        match self {
            SummaryResponse::Single(s) => Some(s.summary_text),
            SummaryResponse::Batch(batch) => batch.into_iter().next().map(|s| s.summary_text),
        }
    }
}

/// Abstractive compressor backed by a summarization service.
pub struct HttpCompressor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCompressor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let endpoint = endpoint.into();
        let client = build_client(&endpoint, timeout)?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Compressor for HttpCompressor {
    async fn compress(
        &self,
        facts: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String, CollaboratorError> {
        let payload = json!({
            "text": facts,
            "min_length": min_length,
            "max_length": max_length,
        });
        let response: SummaryResponse = post_json(&self.client, &self.endpoint, &payload).await?;
        response.into_text().ok_or_else(|| CollaboratorError::Format {
            origin: self.endpoint.clone(),
            message: "no summary in response".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    #[test]
    fn test_summary_response_shapes() {
        let single: SummaryResponse =
            serde_json::from_str(r#"{"summary_text": "Solid speaker."}"#).unwrap();
        assert_eq!(single.into_text().as_deref(), Some("Solid speaker."));

        let batch: SummaryResponse =
            serde_json::from_str(r#"[{"summary_text": "Loud."}, {"summary_text": "x"}]"#).unwrap();
        assert_eq!(batch.into_text().as_deref(), Some("Loud."));

        let empty: SummaryResponse = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[test]
    fn test_align_annotations() {
        let raw: Vec<RawAnnotation> = serde_json::from_str(
            r#"[{"aspect": ["bass"], "sentiment": ["Positive"], "confidence": [0.8]},
                {"aspect": [], "sentiment": [], "confidence": []}]"#,
        )
        .unwrap();

        let aspects = align_annotations(raw.clone(), 2, "http://annotator.test").unwrap();
        assert_eq!(
            aspects[0],
            vec![AspectSentiment::new("bass", Sentiment::Positive, Some(0.8))]
        );
        assert!(aspects[1].is_empty());

        let err = align_annotations(raw, 3, "http://annotator.test").unwrap_err();
        assert!(err.to_string().contains("got 2 annotations for 3 reviews"));
    }

    #[test]
    fn test_adapters_construct() {
        let timeout = Duration::from_secs(5);
        assert!(HttpAnnotator::new("http://localhost:9000/annotate", timeout).is_ok());
        assert!(HttpEmbedder::new("http://localhost:9000/embed", timeout).is_ok());
        assert!(HttpCompressor::new("http://localhost:9000/summarize", timeout).is_ok());
    }
}
