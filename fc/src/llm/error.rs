//! Failures talking to a model provider

use std::time::Duration;
use thiserror::Error;

/// Statuses worth another attempt after a pause (429 is handled separately)
pub(crate) fn transient_status(code: u16) -> bool {
    matches!(code, 408 | 500 | 502 | 503 | 504 | 529)
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP 429; `wait` comes from `retry-after` when the provider sends one
    #[error("provider is throttling requests, try again in {}s", .wait.as_secs())]
    Throttled { wait: Duration },

    #[error("provider answered HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("could not reach the provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode the provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Well-formed JSON that does not carry what we asked for
    #[error("unexpected provider response: {0}")]
    Malformed(String),

    #[error("LLM provider is not set up: {0}")]
    Setup(String),
}

impl LlmError {
    /// Whether the same request may succeed if sent again later
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Throttled { .. } | LlmError::Transport(_) => true,
            LlmError::Status { code, .. } => transient_status(*code),
            LlmError::Decode(_) | LlmError::Malformed(_) | LlmError::Setup(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> LlmError {
        LlmError::Status {
            code,
            body: String::new(),
        }
    }

    #[test]
    fn test_server_side_statuses_are_transient() {
        for code in [408, 500, 502, 503, 504, 529] {
            assert!(status(code).is_transient(), "{code}");
        }
        for code in [400, 401, 403, 404, 422] {
            assert!(!status(code).is_transient(), "{code}");
        }
    }

    #[test]
    fn test_throttle_is_transient_but_setup_is_not() {
        let throttled = LlmError::Throttled {
            wait: Duration::from_secs(20),
        };
        assert!(throttled.is_transient());
        assert!(throttled.to_string().contains("20s"));
        assert!(!LlmError::Setup("GEMINI_API_KEY unset".to_string()).is_transient());
        assert!(!LlmError::Malformed("no candidates".to_string()).is_transient());
    }
}
