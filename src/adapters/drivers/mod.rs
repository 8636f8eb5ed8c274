pub mod azure;
pub mod legacy_http;
pub mod openai;

pub use azure::AzureCompletionBackend;
pub use legacy_http::LegacyHttpBackend;
pub use openai::OpenAiChatBackend;

use crate::config::processor::{DriverKind, ProcessorConfig};
use crate::domain::ports::Driver;
use crate::utils::error::{DriverError, EtlError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// 依 driver 種類建立後端，只在建構時分派一次
pub fn build_driver(config: &ProcessorConfig) -> Result<Arc<dyn Driver>> {
    let driver: Arc<dyn Driver> = match config.driver_kind() {
        DriverKind::OpenAi => Arc::new(OpenAiChatBackend::from_config(config)?),
        DriverKind::Azure => Arc::new(AzureCompletionBackend::from_config(config)?),
        DriverKind::LegacyHttp => Arc::new(LegacyHttpBackend::from_config(config)?),
    };

    tracing::info!(
        "🤖 Using {} driver (model: {})",
        driver.name(),
        config.model()
    );
    Ok(driver)
}

pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| EtlError::ConfigError {
        message: format!("Failed to build HTTP client: {}", e),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusPolicy {
    /// 任何 2xx
    AnySuccess,
    /// 只接受 200
    OkOnly,
}

impl StatusPolicy {
    fn accepts(self, status: StatusCode) -> bool {
        match self {
            StatusPolicy::AnySuccess => status.is_success(),
            StatusPolicy::OkOnly => status == StatusCode::OK,
        }
    }
}

/// 送出請求並取回 body；取消時立即中止並回傳 Cancelled
pub(crate) async fn send_request(
    request: RequestBuilder,
    policy: StatusPolicy,
    cancel: &CancellationToken,
) -> std::result::Result<String, DriverError> {
    let exchange = async {
        let response = request.send().await.map_err(DriverError::from_reqwest)?;
        let status = response.status();
        tracing::debug!("📡 Backend response status: {}", status);

        let body = response.text().await.map_err(DriverError::from_reqwest)?;
        if !policy.accepts(status) {
            return Err(DriverError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        Ok::<String, DriverError>(body)
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DriverError::Cancelled),
        result = exchange => result,
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> std::result::Result<T, DriverError> {
    serde_json::from_str(body).map_err(|e| DriverError::malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::processor::ProcessorSettings;

    fn settings(driver: &str) -> ProcessorSettings {
        ProcessorSettings {
            source_field: Some("text".to_string()),
            target_field: Some("summary".to_string()),
            prompt: Some("summarize".to_string()),
            driver: Some(driver.to_string()),
            api_key: Some("key".to_string()),
            model: Some("model".to_string()),
            api_endpoint: Some("https://example.openai.azure.com".to_string()),
            api_url: Some("https://api.openai.com/v1/completions".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_factory_selects_variant() {
        for (kind, name) in [
            ("openai", "openai_chat"),
            ("azure", "azure_completion"),
            ("legacy_http", "legacy_http"),
        ] {
            let config = ProcessorConfig::from_settings(&settings(kind)).unwrap();
            let driver = build_driver(&config).unwrap();
            assert_eq!(driver.name(), name);
        }
    }

    #[test]
    fn test_status_policy() {
        assert!(StatusPolicy::AnySuccess.accepts(StatusCode::CREATED));
        assert!(!StatusPolicy::OkOnly.accepts(StatusCode::CREATED));
        assert!(StatusPolicy::OkOnly.accepts(StatusCode::OK));
        assert!(!StatusPolicy::AnySuccess.accepts(StatusCode::BAD_GATEWAY));
    }
}
