//! Completion-endpoint error types.
//!
//! Transport failures, timeouts, and non-2xx responses are all treated uniformly
//! by the enhancement pipeline: a single failed attempt goes straight to the
//! fallback path, with no retries. The kinds exist for logging and diagnostics.

use thiserror::Error;

/// Error from LM Studio API calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established (server not running, refused, DNS).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Failed to parse completion response: {0}")]
    Parse(String),
}

impl LlmError {
    /// Classify a `reqwest` transport error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::Connection(err.to_string())
        } else {
            LlmError::Connection(format!("Request failed: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status() {
        let err = LlmError::Http {
            status: 503,
            body: "model loading".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("503"));
        assert!(rendered.contains("model loading"));
    }
}
