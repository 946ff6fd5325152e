//! Report generation.
//!
//! Two report styles: the narrative one written by the report model from a
//! structured prompt, and the list-style one composed locally.

pub mod legacy;
pub mod prompt;

pub use legacy::generate_original_report;
pub use prompt::{build_request, is_degraded, render_final};
