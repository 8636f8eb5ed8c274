use super::{build_client, parse_body, send_request, StatusPolicy};
use crate::config::processor::ProcessorConfig;
use crate::domain::ports::Driver;
use crate::utils::error::{DriverError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI chat completion：單一 user 訊息
pub struct OpenAiChatBackend {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base = base_url.unwrap_or(DEFAULT_OPENAI_BASE_URL).trim_end_matches('/');
        Ok(Self {
            client: build_client(timeout)?,
            url: format!("{}/chat/completions", base),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self> {
        Self::new(
            config.api_key(),
            config.model(),
            config.api_endpoint(),
            config.request_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Driver for OpenAiChatBackend {
    async fn ask(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, DriverError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!("📡 POST {} (model: {})", self.url, self.model);
        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload);

        let body = send_request(request, StatusPolicy::AnySuccess, cancel).await?;
        let response: ChatCompletionResponse = parse_body(&body)?;

        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::malformed("response has no choices"))?
            .message
            .content
            .ok_or_else(|| DriverError::malformed("first choice has no message content"))
    }

    fn name(&self) -> &'static str {
        "openai_chat"
    }
}
