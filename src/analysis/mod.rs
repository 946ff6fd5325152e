//! Analysis modules.
//!
//! Sentiment voting per review and aspect aggregation across reviews.

pub mod aspects;
pub mod sentiment;

pub use aspects::*;
pub use sentiment::*;
