//! File-backed collaborators.

use super::{Annotator, CollaboratorError, Compressor, RawAnnotation, ReviewSource};
use crate::models::AspectSentiment;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

async fn read_file(path: &Path) -> Result<String, CollaboratorError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CollaboratorError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Split review file content into review texts.
///
/// A JSON array of strings is taken as is. Anything else is read as one
/// review per non-blank line.
pub fn parse_reviews(content: &str, origin: &str) -> Result<Vec<String>, CollaboratorError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed).map_err(|e| {
            CollaboratorError::Format {
                origin: origin.to_string(),
                message: e.to_string(),
            }
        });
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Reads reviews from the file named by the locator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReviewSource;

#[async_trait]
impl ReviewSource for FileReviewSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<String>, CollaboratorError> {
        let content = read_file(Path::new(locator)).await?;
        let reviews = parse_reviews(&content, locator)?;
        debug!("Read {} reviews from {}", reviews.len(), locator);
        Ok(reviews)
    }
}

/// Replays precomputed annotations stored as a JSON array, one entry per
/// review in the same order.
#[derive(Debug, Clone)]
pub struct FileAnnotator {
    path: PathBuf,
}

impl FileAnnotator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Annotator for FileAnnotator {
    async fn annotate(
        &self,
        reviews: &[String],
    ) -> Result<Vec<Vec<AspectSentiment>>, CollaboratorError> {
        let content = read_file(&self.path).await?;
        let raw: Vec<RawAnnotation> =
            serde_json::from_str(&content).map_err(|e| CollaboratorError::Format {
                origin: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        if raw.len() < reviews.len() {
            warn!(
                "Annotation file {} covers {} of {} reviews",
                self.path.display(),
                raw.len(),
                reviews.len()
            );
        }

        let mut raw = raw.into_iter();
        Ok(reviews
            .iter()
            .map(|_| raw.next().map(RawAnnotation::into_aspects).unwrap_or_default())
            .collect())
    }
}

/// Extractive mode: the fact sheet is the summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactSheetCompressor;

#[async_trait]
impl Compressor for FactSheetCompressor {
    async fn compress(
        &self,
        facts: &str,
        _min_length: usize,
        _max_length: usize,
    ) -> Result<String, CollaboratorError> {
        Ok(facts.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use tempfile::TempDir;

    #[test]
    fn test_parse_reviews_json_array() {
        let reviews = parse_reviews(r#"  ["great sound", "bad battery"]"#, "inline").unwrap();
        assert_eq!(reviews, vec!["great sound", "bad battery"]);
    }

    #[test]
    fn test_parse_reviews_lines() {
        let reviews = parse_reviews("great sound\n\n  bad battery  \n", "inline").unwrap();
        assert_eq!(reviews, vec!["great sound", "bad battery"]);
    }

    #[test]
    fn test_parse_reviews_bad_json() {
        let err = parse_reviews("[1, 2", "reviews.json").unwrap_err();
        assert!(err.to_string().contains("reviews.json"));
    }

    #[tokio::test]
    async fn test_file_review_source_missing_file() {
        let err = FileReviewSource.fetch("/no/such/reviews.txt").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Io { .. }));
    }

    #[tokio::test]
    async fn test_file_annotator_pads_missing_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotations.json");
        std::fs::write(
            &path,
            r#"[{"aspect": ["sound"], "sentiment": ["Positive"], "confidence": [0.9]}]"#,
        )
        .unwrap();

        let annotator = FileAnnotator::new(&path);
        let reviews = vec!["great sound".to_string(), "meh".to_string()];
        let aspects = annotator.annotate(&reviews).await.unwrap();

        assert_eq!(aspects.len(), 2);
        assert_eq!(
            aspects[0],
            vec![AspectSentiment::new("sound", Sentiment::Positive, Some(0.9))]
        );
        assert!(aspects[1].is_empty());
    }

    #[tokio::test]
    async fn test_fact_sheet_compressor_is_identity() {
        let facts = "Reviews: 1 positive, 0 negative, 0 neutral.";
        let summary = FactSheetCompressor.compress(facts, 60, 180).await.unwrap();
        assert_eq!(summary, facts);
    }
}
