//! The review pipeline: service wiring, artifacts and the stage runner.

pub mod artifacts;
pub mod embedding;
pub mod orchestrator;
pub mod services;

pub use artifacts::DEFAULT_PRODUCT_ID;
pub use orchestrator::{PipelineOrchestrator, PipelineSettings, RunOutcome, RunRequest};
pub use services::Services;
