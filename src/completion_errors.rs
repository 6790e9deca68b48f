//! # Completion Error Types Module
//!
//! Failure kinds of the remote answer fallback. The set is closed so the
//! query resolver maps every failure to a reply with one exhaustive match.

/// Custom error types for completion API calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// Connection, TLS, timeout or server-side (5xx) failures
    #[error("Network error: {0}")]
    Network(String),
    /// Missing, invalid or unauthorized API key
    #[error("Authentication error: {0}")]
    Auth(String),
    /// Rate limit or exhausted quota
    #[error("Quota error: {0}")]
    Quota(String),
    /// The response body could not be turned into an answer
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Any other non-success status (bad request, unknown model, ...)
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl CompletionError {
    /// Stable label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Network(_) => "network",
            CompletionError::Auth(_) => "auth",
            CompletionError::Quota(_) => "quota",
            CompletionError::MalformedResponse(_) => "malformed_response",
            CompletionError::Rejected { .. } => "rejected",
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CompletionError::MalformedResponse(err.to_string())
        } else {
            CompletionError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let error = CompletionError::Quota("insufficient_quota".to_string());
        assert_eq!(error.to_string(), "Quota error: insufficient_quota");

        let error = CompletionError::Rejected {
            status: 400,
            message: "unknown model".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Request rejected with status 400: unknown model"
        );
    }

    #[test]
    fn test_json_errors_are_malformed_responses() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = CompletionError::from(parse_error);
        assert_eq!(error.kind(), "malformed_response");
    }
}
