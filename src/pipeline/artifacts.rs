//! Run artifacts written to the output and embedding directories.

use crate::models::{AspectSentiment, ReviewRecord, Sentiment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Product id used when none is given.
pub const DEFAULT_PRODUCT_ID: &str = "product_summary";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The files a run leaves behind in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Aspects,
    Sentiment,
    Summary,
    Report,
}

impl ArtifactKind {
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Aspects => "_aspects.json",
            ArtifactKind::Sentiment => "_sentiment.json",
            ArtifactKind::Summary => "_summary.txt",
            ArtifactKind::Report => "_report.md",
        }
    }
}

/// File-name-safe product id: anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_product_id(product_id: &str) -> String {
    let cleaned: String = product_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        DEFAULT_PRODUCT_ID.to_string()
    } else {
        cleaned
    }
}

/// Per-review aspects as the annotator produced them.
#[derive(Debug, Serialize)]
pub struct AspectArtifact<'a> {
    pub product_id: &'a str,
    pub reviews: Vec<AspectEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct AspectEntry<'a> {
    pub review: &'a str,
    pub aspects: &'a [AspectSentiment],
}

impl<'a> AspectArtifact<'a> {
    pub fn new(product_id: &'a str, records: &'a [ReviewRecord]) -> Self {
        Self {
            product_id,
            reviews: records
                .iter()
                .map(|r| AspectEntry {
                    review: &r.text,
                    aspects: &r.aspects,
                })
                .collect(),
        }
    }
}

/// Scored reviews with the location of their embeddings.
#[derive(Debug, Serialize)]
pub struct SentimentArtifact<'a> {
    pub product_id: &'a str,
    pub num_reviews: usize,
    pub product_embedding_file: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub reviews: Vec<SentimentEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SentimentEntry<'a> {
    pub review: &'a str,
    pub overall_sentiment: Sentiment,
    pub aspect_sentiments: Vec<(&'a str, Sentiment)>,
    pub embedding_file: Option<String>,
}

impl<'a> SentimentArtifact<'a> {
    /// `embedding_files[i]` is the embedding of `records[i]`, if one was
    /// written.
    pub fn new(
        product_id: &'a str,
        records: &'a [ReviewRecord],
        embedding_files: &[Option<PathBuf>],
        product_embedding_file: Option<&Path>,
    ) -> Self {
        let reviews = records
            .iter()
            .enumerate()
            .map(|(i, record)| SentimentEntry {
                review: &record.text,
                overall_sentiment: record.overall(),
                aspect_sentiments: record.scored_pairs(),
                embedding_file: embedding_files
                    .get(i)
                    .and_then(|p| p.as_deref())
                    .map(|p| p.display().to_string()),
            })
            .collect();

        Self {
            product_id,
            num_reviews: records.len(),
            product_embedding_file: product_embedding_file.map(|p| p.display().to_string()),
            generated_at: Utc::now(),
            reviews,
        }
    }
}

/// Writes artifacts under a fixed output directory and embedding directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    embedding_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>, embedding_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            embedding_dir: embedding_dir.into(),
        }
    }

    pub fn path_for(&self, product_id: &str, kind: ArtifactKind) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", sanitize_product_id(product_id), kind.suffix()))
    }

    /// Path of a review embedding; `index` is 1-based.
    pub fn review_embedding_path(&self, product_id: &str, index: usize) -> PathBuf {
        self.embedding_dir
            .join(format!("{}_r{}.json", sanitize_product_id(product_id), index))
    }

    pub fn product_embedding_path(&self, product_id: &str) -> PathBuf {
        self.embedding_dir
            .join(format!("{}_product.json", sanitize_product_id(product_id)))
    }

    pub async fn write_text(
        &self,
        product_id: &str,
        kind: ArtifactKind,
        content: &str,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(product_id, kind);
        write_file(&path, content.as_bytes()).await?;
        Ok(path)
    }

    pub async fn write_json<T: Serialize>(
        &self,
        product_id: &str,
        kind: ArtifactKind,
        value: &T,
    ) -> Result<PathBuf, ArtifactError> {
        let content = serde_json::to_string_pretty(value).map_err(|source| {
            ArtifactError::Serialize {
                what: "artifact",
                source,
            }
        })?;
        self.write_text(product_id, kind, &content).await
    }

    /// Store one embedding vector as a JSON array at `path`.
    pub async fn write_embedding(&self, path: &Path, vector: &[f32]) -> Result<(), ArtifactError> {
        let content = serde_json::to_string(vector).map_err(|source| ArtifactError::Serialize {
            what: "embedding",
            source,
        })?;
        write_file(path, content.as_bytes()).await
    }
}

async fn write_file(path: &Path, content: &[u8]) -> Result<(), ArtifactError> {
    let io_error = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
    }
    tokio::fs::write(path, content).await.map_err(io_error)?;

    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}
