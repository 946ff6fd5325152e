//! Service container for the pipeline.
//!
//! Every collaborator a run needs is built once by [`Services::init`] and
//! handed to the orchestrator. Nothing is held in globals.

use super::artifacts::ArtifactStore;
use super::orchestrator::PipelineError;
use crate::collaborators::{
    Annotator, Compressor, Embedder, FactSheetCompressor, FileAnnotator, FileReviewSource,
    HttpAnnotator, HttpCompressor, HttpEmbedder, ReviewSource,
};
use crate::config::Config;
use crate::llm::{ReqwestTransport, RetryingClient, TokioSleeper};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Collaborators shared by every stage of a run.
pub struct Services {
    pub source: Arc<dyn ReviewSource>,
    pub annotator: Arc<dyn Annotator>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub compressor: Arc<dyn Compressor>,
    pub llm: Option<RetryingClient>,
    pub artifacts: ArtifactStore,
}

impl Services {
    /// Build all collaborators from the configuration.
    ///
    /// The report model client is only built when an API key is available.
    pub fn init(config: &Config) -> Result<Self, PipelineError> {
        let annotator: Arc<dyn Annotator> = match (&config.annotator.file, &config.annotator.endpoint)
        {
            (Some(path), _) => {
                info!("Using annotations from {}", path.display());
                Arc::new(FileAnnotator::new(path))
            }
            (None, Some(endpoint)) => {
                info!("Using annotator service at {}", endpoint);
                let timeout = Duration::from_secs(config.annotator.timeout_seconds);
                Arc::new(HttpAnnotator::new(endpoint, timeout).map_err(PipelineError::Setup)?)
            }
            (None, None) => {
                return Err(PipelineError::Config(
                    "no annotator configured: pass --annotations or --annotator-url".to_string(),
                ))
            }
        };

        let embedder: Option<Arc<dyn Embedder>> = match &config.embedding.endpoint {
            Some(endpoint) => {
                let timeout = Duration::from_secs(config.embedding.timeout_seconds);
                Some(Arc::new(
                    HttpEmbedder::new(endpoint, timeout).map_err(PipelineError::Setup)?,
                ))
            }
            None => {
                debug!("No embedding service configured; skipping embeddings");
                None
            }
        };

        let compressor: Arc<dyn Compressor> = match &config.summarizer.endpoint {
            Some(endpoint) => {
                let timeout = Duration::from_secs(config.summarizer.timeout_seconds);
                Arc::new(HttpCompressor::new(endpoint, timeout).map_err(PipelineError::Setup)?)
            }
            None => {
                debug!("No summarizer service configured; using the fact sheet");
                Arc::new(FactSheetCompressor)
            }
        };

        let llm = match &config.llm.api_key {
            Some(key) => {
                let timeout = Duration::from_secs(config.llm.timeout_seconds);
                let transport = ReqwestTransport::new(timeout, Some(key.clone()))
                    .map_err(|e| PipelineError::Config(e.to_string()))?;
                let client = RetryingClient::new(
                    Arc::new(transport),
                    Arc::new(TokioSleeper),
                    config.llm.endpoint(),
                    config.llm.max_retries,
                );
                info!("Report model: {} at {}", config.llm.model, client.endpoint());
                Some(client)
            }
            None => None,
        };

        Ok(Self {
            source: Arc::new(FileReviewSource),
            annotator,
            embedder,
            compressor,
            llm,
            artifacts: ArtifactStore::new(&config.general.output_dir, &config.embedding.dir),
        })
    }

    /// Release the collaborators.
    pub fn shutdown(self) {
        let Services { llm, embedder, .. } = self;
        debug!(
            report_model = llm.is_some(),
            embedder = embedder.is_some(),
            "Services shut down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_init_requires_an_annotator() {
        let config = Config::default();
        let err = Services::init(&config).err().unwrap();
        assert!(err.to_string().contains("no annotator configured"));
    }

    #[test]
    fn test_init_without_api_key_has_no_report_model() {
        let mut config = Config::default();
        config.annotator.file = Some(PathBuf::from("annotations.json"));

        let services = Services::init(&config).unwrap();
        assert!(services.llm.is_none());
        assert!(services.embedder.is_none());
        services.shutdown();
    }

    #[test]
    fn test_init_builds_report_client() {
        let mut config = Config::default();
        config.annotator.endpoint = Some("http://localhost:9000/annotate".to_string());
        config.llm.api_key = Some("test-key".to_string());
        config.llm.model = "test-model".to_string();

        let services = Services::init(&config).unwrap();
        let llm = services.llm.as_ref().unwrap();
        assert!(llm.endpoint().contains("models/test-model:generateContent"));
    }
}
