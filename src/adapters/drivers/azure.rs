use super::{build_client, parse_body, send_request, StatusPolicy};
use crate::config::processor::ProcessorConfig;
use crate::domain::ports::Driver;
use crate::utils::error::{DriverError, EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: [&'a str; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub(crate) choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub(crate) text: Option<String>,
}

impl CompletionResponse {
    pub(crate) fn into_first_text(self) -> std::result::Result<String, DriverError> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::malformed("response has no choices"))?
            .text
            .ok_or_else(|| DriverError::malformed("first choice has no text"))
    }
}

/// Azure OpenAI legacy completion，model 即 deployment 名稱
pub struct AzureCompletionBackend {
    client: Client,
    url: String,
    api_version: String,
    api_key: String,
}

impl AzureCompletionBackend {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: &str,
        deployment: &str,
        api_version: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let deployment = deployment.trim().trim_matches('/');
        if deployment.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "model".to_string(),
            });
        }

        Ok(Self {
            client: build_client(timeout)?,
            url: format!(
                "{}/openai/deployments/{}/completions",
                endpoint.trim_end_matches('/'),
                deployment
            ),
            api_version: api_version.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self> {
        let endpoint = config
            .api_endpoint()
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "api_endpoint".to_string(),
            })?;

        Self::new(
            config.api_key(),
            endpoint,
            config.model(),
            config.api_version(),
            config.request_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Driver for AzureCompletionBackend {
    async fn ask(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, DriverError> {
        let payload = CompletionRequest {
            prompt: [prompt],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        tracing::debug!("📡 POST {} (api-version: {})", self.url, self.api_version);
        let request = self
            .client
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&payload);

        let body = send_request(request, StatusPolicy::AnySuccess, cancel).await?;
        parse_body::<CompletionResponse>(&body)?.into_first_text()
    }

    fn name(&self) -> &'static str {
        "azure_completion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_ask_uses_deployment_url_and_fixed_parameters() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-davinci/completions")
                .query_param("api-version", "2023-05-15")
                .header("api-key", "azure-key")
                .json_body(serde_json::json!({
                    "prompt": ["translate this"],
                    "max_tokens": 2048,
                    "temperature": 0.0
                }));
            then.status(200).json_body(serde_json::json!({
                "choices": [{"text": "traduire ceci", "index": 0, "finish_reason": "stop"}]
            }));
        });

        let backend = AzureCompletionBackend::new(
            "azure-key",
            &format!("{}/", server.base_url()),
            "text-davinci",
            "2023-05-15",
            None,
        )
        .unwrap();
        let text = backend
            .ask("translate this", &CancellationToken::new())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(text, "traduire ceci");
    }

    #[tokio::test]
    async fn test_missing_text_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/deployments/d/completions");
            then.status(200)
                .json_body(serde_json::json!({"choices": [{"index": 0}]}));
        });

        let backend =
            AzureCompletionBackend::new("k", &server.base_url(), "d", "2023-05-15", None).unwrap();
        let err = backend.ask("p", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_non_string_text_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/deployments/d/completions");
            then.status(200)
                .json_body(serde_json::json!({"choices": [{"text": 5}]}));
        });

        let backend =
            AzureCompletionBackend::new("k", &server.base_url(), "d", "2023-05-15", None).unwrap();
        let err = backend.ask("p", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::MalformedResponse { .. }));
    }

    #[test]
    fn test_url_joins_endpoint_and_deployment() {
        let backend =
            AzureCompletionBackend::new("k", "https://x.openai.azure.com/", "/d1/", "v", None)
                .unwrap();
        assert_eq!(
            backend.url(),
            "https://x.openai.azure.com/openai/deployments/d1/completions"
        );
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/deployments/d/completions");
            then.status(503).body("overloaded");
        });

        let backend =
            AzureCompletionBackend::new("k", &server.base_url(), "d", "2023-05-15", None).unwrap();
        let err = backend.ask("p", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::Status { status: 503, .. }));
    }

    #[test]
    fn test_empty_deployment_is_rejected() {
        assert!(AzureCompletionBackend::new("k", "https://x.openai.azure.com", " ", "v", None)
            .is_err());
    }
}
