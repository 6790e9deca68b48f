//! # Completion Module
//!
//! The remote answer fallback: one best-effort call to an OpenAI-compatible
//! `/completions` endpoint. No retries. The request carries a timeout and an
//! elapsed timeout surfaces as [`CompletionError::Network`].

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion_errors::CompletionError;
use crate::config::CompletionSettings;

/// Longest upstream error text kept in a [`CompletionError`]
const MAX_ERROR_TEXT: usize = 500;

/// A source of generated answers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `prompt` with at most `max_tokens` output tokens.
    ///
    /// Returns the trimmed, non-empty completion text.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pull the answer text out of a `/completions` response body
pub fn extract_completion_text(body: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_str(body)?;

    let text = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".to_string()))?
        .text
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(CompletionError::MalformedResponse(
            "completion text is empty".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Map a non-success HTTP status and its body to a failure kind
pub fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => {
            let body = body.trim();
            if body.starts_with('<') {
                // Proxies answer with HTML error pages
                format!("{status} (server returned an HTML error page)")
            } else if body.len() > MAX_ERROR_TEXT {
                let cut = (0..=MAX_ERROR_TEXT)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                format!("{status} - {}... (truncated)", &body[..cut])
            } else if body.is_empty() {
                status.to_string()
            } else {
                format!("{status} - {body}")
            }
        }
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => CompletionError::Quota(message),
        status if status.is_server_error() => CompletionError::Network(message),
        status => CompletionError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

/// Completion client for OpenAI-compatible HTTP APIs
pub struct OpenAiCompletionClient {
    http_client: HttpClient,
    completions_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletionClient {
    /// Create a client with the configured base URL, model and timeout
    pub fn new(settings: &CompletionSettings, api_key: Option<String>) -> anyhow::Result<Self> {
        let http_client = HttpClient::builder().timeout(settings.timeout()).build()?;

        Ok(Self {
            http_client,
            completions_url: format!("{}/completions", settings.api_base.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
        })
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::Auth("no API key configured".to_string()))?;

        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
        };

        debug!(model = %self.model, max_tokens, prompt_length = prompt.len(), "Sending completion request");

        let response = self
            .http_client
            .post(&self.completions_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let text = extract_completion_text(&body)?;
        debug!(answer_length = text.len(), "Completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo-instruct",
            prompt: "Answer the following query:\nexplain entropy",
            max_tokens: 100,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo-instruct");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["prompt"], "Answer the following query:\nexplain entropy");
    }

    #[test]
    fn test_completions_url_joins_base() {
        let settings = CompletionSettings {
            api_base: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiCompletionClient::new(&settings, None).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:8080/v1/completions");
    }

    #[test]
    fn test_long_error_bodies_are_truncated() {
        let body = "é".repeat(MAX_ERROR_TEXT);
        match classify_failure(StatusCode::BAD_REQUEST, &body) {
            CompletionError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert!(message.ends_with("... (truncated)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
