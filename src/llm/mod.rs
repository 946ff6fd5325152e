//! Report model access.
//!
//! This module provides the retrying client used to turn the aggregated
//! opinions into a written report, plus the error taxonomy and injectable
//! transport/sleeper capabilities it depends on.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{RetryingClient, DEFAULT_MAX_RETRIES};
pub use error::is_error_sentinel;
pub use transport::{ReqwestTransport, TokioSleeper};
