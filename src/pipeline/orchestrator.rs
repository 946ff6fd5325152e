//! End-to-end run of the review pipeline.
//!
//! fetch -> annotate -> score -> embed -> summarize -> report. Each stage
//! writes its artifact before the next one starts. Report model failures
//! never abort a run: the error text becomes the report and the run is
//! marked degraded.

use super::artifacts::{AspectArtifact, ArtifactError, ArtifactKind, SentimentArtifact};
use super::embedding::{embedding_prompt, mean_vector};
use super::services::Services;
use crate::cli::ReportStyle;
use crate::collaborators::CollaboratorError;
use crate::models::{ProductSummary, ReviewRecord};
use crate::report::{build_request, generate_original_report, is_degraded, render_final};
use crate::summary::{build_fact_sheet, polish_summary};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch reviews: {0}")]
    Source(#[source] CollaboratorError),

    #[error("aspect extraction failed: {0}")]
    Annotation(#[source] CollaboratorError),

    #[error("failed to set up collaborator: {0}")]
    Setup(#[source] CollaboratorError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// One product to process.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub product_id: String,
    /// Where the review source should read from.
    pub locator: String,
    pub style: ReportStyle,
}

/// Knobs that shape a run but not its inputs.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_reviews: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub show_progress: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_reviews: 50,
            min_length: 60,
            max_length: 180,
            show_progress: false,
        }
    }
}

/// What a completed run hands back to its driver.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    #[serde(skip)]
    pub product_id: String,
    pub simple_summary: String,
    pub contextual_report: String,
    pub degraded: bool,
    #[serde(skip)]
    pub report_path: PathBuf,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(PipelineOutput),
    /// The source produced no reviews, or the annotator found no aspects in
    /// any of them; nothing was written.
    NoReviews,
}

pub struct PipelineOrchestrator {
    services: Services,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(services: Services, settings: PipelineSettings) -> Self {
        Self { services, settings }
    }

    /// Give the services back, e.g. to shut them down.
    pub fn into_services(self) -> Services {
        self.services
    }

    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome, PipelineError> {
        let pid = request.product_id.as_str();
        let progress = self.progress_bar();

        // Fetch
        progress.set_message("Fetching reviews...");
        let mut reviews = self
            .services
            .source
            .fetch(&request.locator)
            .await
            .map_err(PipelineError::Source)?;

        if reviews.is_empty() {
            progress.finish_and_clear();
            warn!("No reviews found at {}", request.locator);
            return Ok(RunOutcome::NoReviews);
        }
        if reviews.len() > self.settings.max_reviews {
            info!(
                "Keeping the first {} of {} reviews",
                self.settings.max_reviews,
                reviews.len()
            );
            reviews.truncate(self.settings.max_reviews);
        }
        info!("Found {} reviews", reviews.len());

        // Annotate
        progress.set_message(format!("Extracting aspects from {} reviews...", reviews.len()));
        let annotations = self
            .services
            .annotator
            .annotate(&reviews)
            .await
            .map_err(PipelineError::Annotation)?;

        if annotations.iter().all(Vec::is_empty) {
            progress.finish_and_clear();
            warn!("The annotator found no aspects in {} reviews", reviews.len());
            return Ok(RunOutcome::NoReviews);
        }
        if annotations.len() != reviews.len() {
            return Err(PipelineError::Annotation(CollaboratorError::Format {
                origin: "annotator".to_string(),
                message: format!(
                    "got {} annotations for {} reviews",
                    annotations.len(),
                    reviews.len()
                ),
            }));
        }

        let records: Vec<ReviewRecord> = reviews
            .into_iter()
            .zip(annotations)
            .map(|(text, aspects)| ReviewRecord::new(text, aspects))
            .collect();

        self.services
            .artifacts
            .write_json(pid, ArtifactKind::Aspects, &AspectArtifact::new(pid, &records))
            .await?;

        // Score
        progress.set_message("Scoring sentiment...");
        let product = ProductSummary::new(pid, records);
        if product.aggregated.is_empty() {
            warn!("No review expressed a positive or negative aspect");
        } else {
            debug!(
                liked = product.aggregated.liked.len(),
                disliked = product.aggregated.disliked.len(),
                "Aggregated opinions"
            );
        }

        let (embedding_files, product_embedding) = self.embed_reviews(pid, &product.reviews).await?;
        self.services
            .artifacts
            .write_json(
                pid,
                ArtifactKind::Sentiment,
                &SentimentArtifact::new(
                    pid,
                    &product.reviews,
                    &embedding_files,
                    product_embedding.as_deref(),
                ),
            )
            .await?;

        // Summarize
        progress.set_message("Summarizing opinions...");
        let simple_summary = self.summarize(pid, &product.reviews).await;
        self.services
            .artifacts
            .write_text(pid, ArtifactKind::Summary, &simple_summary)
            .await?;

        // Report
        let mut degraded = false;
        let mut sections = Vec::new();

        if request.style.includes_narrative() {
            progress.set_message("Generating contextual report...");
            let narrative = self.narrative_report(&product).await?;
            degraded = is_degraded(&narrative);
            sections.push(narrative);
        }
        if request.style.includes_list() {
            sections.push(generate_original_report(&simple_summary, &product));
        }

        let contextual_report = sections.join("\n\n");
        let report_path = self
            .services
            .artifacts
            .write_text(pid, ArtifactKind::Report, &contextual_report)
            .await?;

        if degraded {
            progress.abandon_with_message("Report model unavailable; report is degraded");
            warn!("Report degraded: the report model call failed");
        } else {
            progress.finish_with_message("Report complete");
        }
        info!("Report saved to {}", report_path.display());

        Ok(RunOutcome::Completed(PipelineOutput {
            product_id: pid.to_string(),
            simple_summary,
            contextual_report,
            degraded,
            report_path,
        }))
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Embed every review and their mean. Embedding failures only cost the
    /// affected paths; write failures end the run.
    async fn embed_reviews(
        &self,
        pid: &str,
        records: &[ReviewRecord],
    ) -> Result<(Vec<Option<PathBuf>>, Option<PathBuf>), PipelineError> {
        let Some(embedder) = &self.services.embedder else {
            return Ok((vec![None; records.len()], None));
        };

        let artifacts = &self.services.artifacts;
        let mut files = Vec::with_capacity(records.len());
        let mut vectors = Vec::new();

        for (i, record) in records.iter().enumerate() {
            match embedder.embed(&embedding_prompt(record)).await {
                Ok(vector) => {
                    let path = artifacts.review_embedding_path(pid, i + 1);
                    artifacts.write_embedding(&path, &vector).await?;
                    vectors.push(vector);
                    files.push(Some(path));
                }
                Err(e) => {
                    warn!(review = i + 1, error = %e, "Embedding failed");
                    files.push(None);
                }
            }
        }

        let product_file = match mean_vector(&vectors) {
            Some(mean) => {
                let path = artifacts.product_embedding_path(pid);
                artifacts.write_embedding(&path, &mean).await?;
                Some(path)
            }
            None => {
                if !vectors.is_empty() {
                    warn!("Review embeddings differ in size; skipping product embedding");
                }
                None
            }
        };

        Ok((files, product_file))
    }

    async fn summarize(&self, pid: &str, records: &[ReviewRecord]) -> String {
        let facts = build_fact_sheet(records);
        debug!("Fact sheet: {}", facts);

        match self
            .services
            .compressor
            .compress(&facts, self.settings.min_length, self.settings.max_length)
            .await
        {
            Ok(summary) => polish_summary(&summary, pid),
            Err(e) => {
                warn!(error = %e, "Summarization failed");
                format!("Summarization failed: {}", e)
            }
        }
    }

    async fn narrative_report(&self, product: &ProductSummary) -> Result<String, PipelineError> {
        let llm = self.services.llm.as_ref().ok_or_else(|| {
            PipelineError::Config("the narrative report needs an API key".to_string())
        })?;

        let request = build_request(&product.aggregated, &product.product_id);
        let body = match llm.generate(&request).await {
            Ok(text) => text,
            Err(e) => e.to_string(),
        };
        Ok(render_final(&body))
    }
}
