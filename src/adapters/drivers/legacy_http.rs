use super::azure::CompletionResponse;
use super::{build_client, parse_body, send_request, StatusPolicy};
use crate::config::processor::ProcessorConfig;
use crate::domain::ports::Driver;
use crate::utils::error::{DriverError, EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// 沿用舊版處理器的參數，max_tokens 刻意保留為 5
const MAX_TOKENS: u32 = 5;
const TEMPERATURE: u8 = 0;

#[derive(Debug, Serialize)]
struct RawCompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: u8,
}

/// 直接以 JSON POST 到設定的 completion URL
pub struct LegacyHttpBackend {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LegacyHttpBackend {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self> {
        let api_url = config.api_url().ok_or_else(|| EtlError::MissingConfigError {
            field: "api_url".to_string(),
        })?;

        Self::new(
            api_url,
            config.api_key(),
            config.model(),
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl Driver for LegacyHttpBackend {
    async fn ask(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, DriverError> {
        let payload = RawCompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        tracing::debug!("📡 POST {} (model: {})", self.api_url, self.model);
        let request = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .body(serde_json::to_vec(&payload).map_err(|e| DriverError::malformed(e.to_string()))?);

        let body = send_request(request, StatusPolicy::OkOnly, cancel).await?;
        parse_body::<CompletionResponse>(&body)?.into_first_text()
    }

    fn name(&self) -> &'static str {
        "legacy_http"
    }
}
