//! Chat-completions client for an Anthropic-style messages API.

use crate::retry::{RetryConfig, with_retry};
use crate::{Error, Result};
use mastery_core::MasteryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

pub(crate) fn first_text(response: ChatResponse) -> Result<String> {
    for block in response.content {
        if let ContentBlock::Text { text } = block {
            return Ok(text);
        }
    }
    Err(Error::EmptyResponse)
}

#[derive(Debug, Clone)]
pub struct TutorClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    attempt_timeout: Duration,
    retry: RetryConfig,
}

impl TutorClient {
    pub fn new(api_key: impl Into<String>, config: &MasteryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: config
                .get_str("api.base_url")
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.get_str("model").unwrap_or(DEFAULT_MODEL).to_string(),
            max_tokens: config.get_u64("api.max_tokens").unwrap_or(4096) as u32,
            attempt_timeout: Duration::from_secs(config.get_u64("api.timeout_secs").unwrap_or(20)),
            retry: RetryConfig::from_config(config),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the conversation and returns the first text block of the reply.
    /// Transient failures (429, 5xx, connection/timeout) are retried with
    /// exponential backoff; terminal failures propagate unchanged.
    pub async fn complete(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages,
        };
        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "sending chat request"
        );

        let response = with_retry(self.retry, || self.send_once(&request)).await?;
        first_text(response)
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.attempt_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ChatResponse>().await?)
    }
}
