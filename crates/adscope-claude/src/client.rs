//! HTTP client for the Anthropic Messages API.
//!
//! Sends one single-turn user message per call and returns the concatenated
//! text of the reply. Transient failures are retried inside the client; the
//! caller only ever sees the final outcome.

use std::time::Duration;

use adscope_core::{AppConfig, JudgmentOracle, OracleError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;

use crate::error::ClaudeError;
use crate::retry::{is_retriable, retry_with_backoff};
use crate::types::{MessagesRequest, MessagesResponse, WireMessage};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const ERROR_BODY_LIMIT: usize = 500;

/// Client for the Anthropic Messages API.
///
/// Use [`ClaudeClient::new`] for production or [`ClaudeClient::with_base_url`]
/// to point at a mock server in tests.
pub struct ClaudeClient {
    http: Client,
    messages_url: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("messages_url", &self.messages_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ClaudeClient {
    /// Creates a client pointed at the production Anthropic API.
    ///
    /// # Errors
    ///
    /// Returns [`ClaudeError::InvalidConfig`] if the API key is not a valid
    /// header value, or [`ClaudeError::Http`] if the `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ClaudeError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`ClaudeClient::new`].
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ClaudeError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| ClaudeError::InvalidConfig(format!("API key is not a valid header: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("adscope/0.1 (creative-analysis)")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            messages_url: format!("{}/messages", base_url.trim_end_matches('/')),
            model: model.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Builds a client from the `ANTHROPIC_*` and `ADSCOPE_LLM_*` settings.
    ///
    /// # Errors
    ///
    /// Same as [`ClaudeClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClaudeError> {
        Ok(Self::with_base_url(
            &config.anthropic_api_key,
            &config.anthropic_model,
            config.llm_timeout_secs,
            &config.anthropic_base_url,
        )?
        .with_max_tokens(config.llm_max_tokens)
        .with_max_retries(config.llm_max_retries))
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Additional attempts after the first on transient failures.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` as a single user message and returns the reply text.
    ///
    /// # Errors
    ///
    /// - [`ClaudeError::Api`] on a non-2xx status that survived retries.
    /// - [`ClaudeError::Http`] on network failure that survived retries.
    /// - [`ClaudeError::Deserialize`] if the body is not a Messages response.
    /// - [`ClaudeError::EmptyResponse`] if the reply has no text.
    pub async fn complete(&self, prompt: &str) -> Result<String, ClaudeError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![WireMessage::user(prompt)],
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Claude messages request");

        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_once(&request)
        })
        .await?;

        if response.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(max_tokens = self.max_tokens, "Claude reply truncated at max_tokens");
        }

        let text = response.text();
        if text.trim().is_empty() {
            return Err(ClaudeError::EmptyResponse);
        }
        Ok(text)
    }

    async fn send_once(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse, ClaudeError> {
        let response = self
            .http
            .post(&self.messages_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ClaudeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClaudeError::Deserialize {
            context: self.messages_url.clone(),
            source: e,
        })
    }
}

#[async_trait]
impl JudgmentOracle for ClaudeClient {
    async fn judge(&self, prompt: &str) -> Result<String, OracleError> {
        self.complete(prompt).await.map_err(|err| OracleError {
            retriable: is_retriable(&err),
            detail: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_strips_trailing_slash() {
        let client = ClaudeClient::with_base_url("k", "m", 30, "http://localhost:9/v1/")
            .expect("client construction should not fail");
        assert_eq!(client.messages_url, "http://localhost:9/v1/messages");
    }

    #[test]
    fn rejects_api_key_with_newline() {
        let result = ClaudeClient::new("bad\nkey", "m", 30);
        assert!(matches!(result, Err(ClaudeError::InvalidConfig(_))));
    }

    #[test]
    fn debug_output_omits_api_key() {
        let client = ClaudeClient::new("sk-secret", "claude-sonnet-4-20250514", 30)
            .expect("client construction should not fail");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("claude-sonnet-4-20250514"));
    }
}
