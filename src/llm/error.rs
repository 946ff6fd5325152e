//! Error taxonomy for the report model call.
//!
//! Every failed attempt is classified as retryable or terminal. Terminal
//! errors render as sentinel strings that start with
//! [`ERROR_SENTINEL_PREFIX`], so a report carrying one can be recognised
//! downstream.

use thiserror::Error;

/// Every terminal API error message starts with this.
pub const ERROR_SENTINEL_PREFIX: &str = "--- Error:";

/// Failure below HTTP: the request never produced a status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("response carried no generated text")]
    EmptyResponse,
}

/// Outcome of classifying an [`AttemptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl AttemptError {
    /// Classify this failure to decide whether another attempt is worth it.
    ///
    /// Rate limiting, server errors and transport failures are retried.
    /// Other HTTP statuses and empty bodies are not.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            AttemptError::Transport(TransportError::Timeout(_)) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            AttemptError::Transport(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            AttemptError::Status(429) => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            AttemptError::Status(code) if *code >= 500 => ErrorClassification {
                error_type: "ServerError",
                retryable: true,
            },
            AttemptError::Status(_) => ErrorClassification {
                error_type: "ClientError",
                retryable: false,
            },
            AttemptError::EmptyResponse => ErrorClassification {
                error_type: "MalformedResponse",
                retryable: false,
            },
        }
    }

    /// The terminal error reported when this failure is not retried.
    pub fn into_terminal(self, max_retries: u32) -> ApiError {
        match self {
            AttemptError::Status(code) if code != 429 && code < 500 => ApiError::Status(code),
            AttemptError::EmptyResponse => ApiError::EmptyResponse,
            _ => ApiError::RetriesExhausted(max_retries),
        }
    }
}

/// Terminal result of the retrying client. The `Display` form is the
/// sentinel string that ends up in a degraded report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("--- Error: Could not parse LLM response. ---")]
    EmptyResponse,

    #[error("--- Error: HTTP {0} from API. Check API Key or Model Name. ---")]
    Status(u16),

    #[error("--- Error: API call failed after {0} retries. ---")]
    RetriesExhausted(u32),
}

/// Returns true when `text` is a terminal API error sentinel.
pub fn is_error_sentinel(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_SENTINEL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let class = AttemptError::Status(429).classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(AttemptError::Status(500).classify().retryable);
        assert!(AttemptError::Status(503).classify().retryable);
    }

    #[test]
    fn test_client_errors_are_terminal() {
        for code in [400, 401, 403, 404] {
            let class = AttemptError::Status(code).classify();
            assert!(!class.retryable, "{} should not be retried", code);
            assert_eq!(class.error_type, "ClientError");
        }
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        let timeout = AttemptError::from(TransportError::Timeout("90s".into()));
        assert_eq!(timeout.classify().error_type, "TimeoutError");
        assert!(timeout.classify().retryable);

        let reset = AttemptError::from(TransportError::Connect("reset".into()));
        assert!(reset.classify().retryable);
    }

    #[test]
    fn test_empty_response_is_terminal() {
        assert!(!AttemptError::EmptyResponse.classify().retryable);
        assert_eq!(
            AttemptError::EmptyResponse.into_terminal(5),
            ApiError::EmptyResponse
        );
    }

    #[test]
    fn test_sentinel_messages() {
        assert_eq!(
            ApiError::Status(401).to_string(),
            "--- Error: HTTP 401 from API. Check API Key or Model Name. ---"
        );
        assert_eq!(
            ApiError::RetriesExhausted(5).to_string(),
            "--- Error: API call failed after 5 retries. ---"
        );
        for err in [
            ApiError::EmptyResponse,
            ApiError::Status(404),
            ApiError::RetriesExhausted(3),
        ] {
            assert!(is_error_sentinel(&err.to_string()));
        }
        assert!(!is_error_sentinel("## Final Report"));
    }
}
