//! External collaborators of the pipeline.
//!
//! The review source, the aspect annotator, the embedder and the summary
//! compressor are all behind traits so the pipeline can run against files,
//! HTTP services or test doubles.

pub mod http;
pub mod local;

use crate::models::{parse_confidence, AspectSentiment, Sentiment};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

pub use http::{HttpAnnotator, HttpCompressor, HttpEmbedder};
pub use local::{FactSheetCompressor, FileAnnotator, FileReviewSource};

/// Failure inside a collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data from {origin}: {message}")]
    Format { origin: String, message: String },

    #[error("request to {endpoint} failed: {message}")]
    Http { endpoint: String, message: String },
}

/// Yields raw review texts, in display order, for a locator such as a file
/// path or a listing URL.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<String>, CollaboratorError>;
}

/// Extracts aspects from reviews. The result is aligned with the input:
/// element `i` holds the aspects of review `i`.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn annotate(
        &self,
        reviews: &[String],
    ) -> Result<Vec<Vec<AspectSentiment>>, CollaboratorError>;
}

/// Maps a short text to a fixed-size vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError>;
}

/// Shortens a fact sheet into a summary of bounded length.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(
        &self,
        facts: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String, CollaboratorError>;
}

/// Annotator output for one review: parallel arrays of terms, labels and
/// confidences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    #[serde(default)]
    pub aspect: Vec<String>,
    #[serde(default)]
    pub sentiment: Vec<String>,
    #[serde(default)]
    pub confidence: Vec<Value>,
}

impl RawAnnotation {
    /// Pair terms with labels, stopping at the shorter of the two arrays.
    /// A missing or non-numeric confidence leaves the aspect unweighted.
    pub fn into_aspects(self) -> Vec<AspectSentiment> {
        let confidence = self.confidence;
        self.aspect
            .into_iter()
            .zip(self.sentiment)
            .enumerate()
            .map(|(i, (term, label))| {
                let confidence = confidence.get(i).and_then(parse_confidence);
                match Sentiment::parse(&label) {
                    Some(sentiment) => AspectSentiment::new(term, sentiment, confidence),
                    None => AspectSentiment {
                        confidence,
                        ..AspectSentiment::unscored(term)
                    },
                }
            })
            .collect()
    }
}
