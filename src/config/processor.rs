use crate::core::prompt::PromptBuilder;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_range, validate_required_field,
    validate_url,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_METRIC_NAME: &str = "open_ai_request";
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";
const NONE_ENDPOINT: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    OpenAi,
    Azure,
    LegacyHttp,
}

impl DriverKind {
    pub const ALL: [&'static str; 3] = ["openai", "azure", "legacy_http"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::OpenAi => "openai",
            DriverKind::Azure => "azure",
            DriverKind::LegacyHttp => "legacy_http",
        }
    }
}

impl FromStr for DriverKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        validate_one_of("driver", s, &Self::ALL)?;
        Ok(match s {
            "openai" => DriverKind::OpenAi,
            "azure" => DriverKind::Azure,
            _ => DriverKind::LegacyHttp,
        })
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[processor]` 區塊的原始設定，所有欄位在驗證前都是可選的
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorSettings {
    pub source_field: Option<String>,
    pub target_field: Option<String>,
    #[serde(alias = "instruction_template")]
    pub prompt: Option<String>,
    pub prompt_template: Option<String>,
    pub driver: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_url: Option<String>,
    pub api_version: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub metric_name: Option<String>,
}

/// 驗證後的處理器設定，建構後不可變
#[derive(Clone)]
pub struct ProcessorConfig {
    source_field: String,
    target_field: String,
    instruction: String,
    prompt_template: String,
    driver_kind: DriverKind,
    api_key: String,
    model: String,
    api_endpoint: Option<String>,
    api_url: Option<String>,
    api_version: String,
    request_timeout: Option<Duration>,
    metric_name: String,
}

impl ProcessorConfig {
    pub fn from_settings(settings: &ProcessorSettings) -> Result<Self> {
        let source_field = validate_required_field("source_field", &settings.source_field)?;
        let target_field = validate_required_field("target_field", &settings.target_field)?;
        let instruction = validate_required_field("prompt", &settings.prompt)?;
        let driver_kind: DriverKind =
            validate_required_field("driver", &settings.driver)?.parse()?;
        let api_key = validate_required_field("api_key", &settings.api_key)?;
        let model = validate_required_field("model", &settings.model)?;

        let prompt_template = match settings.prompt_template.as_deref() {
            Some(template) => PromptBuilder::resolve_template(template)?,
            None => PromptBuilder::CLASSIC.to_string(),
        };

        // api_endpoint 預設為 "none"
        let api_endpoint = settings
            .api_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case(NONE_ENDPOINT))
            .map(str::to_string);
        if let Some(endpoint) = &api_endpoint {
            validate_url("api_endpoint", endpoint)?;
        }

        let api_url = match driver_kind {
            DriverKind::LegacyHttp => {
                let url = validate_required_field("api_url", &settings.api_url)?;
                validate_url("api_url", url)?;
                Some(url.to_string())
            }
            _ => None,
        };

        if driver_kind == DriverKind::Azure && api_endpoint.is_none() {
            return Err(EtlError::MissingConfigError {
                field: "api_endpoint".to_string(),
            });
        }

        let api_version = settings
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
        validate_non_empty_string("api_version", &api_version)?;

        let request_timeout = match settings.request_timeout_seconds {
            Some(secs) => {
                validate_range("request_timeout_seconds", secs, 1, 600)?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let metric_name = settings
            .metric_name
            .clone()
            .unwrap_or_else(|| DEFAULT_METRIC_NAME.to_string());
        validate_non_empty_string("metric_name", &metric_name)?;

        Ok(Self {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            instruction: instruction.to_string(),
            prompt_template,
            driver_kind,
            api_key: api_key.to_string(),
            model: model.to_string(),
            api_endpoint,
            api_url,
            api_version,
            request_timeout,
            metric_name,
        })
    }

    pub fn source_field(&self) -> &str {
        &self.source_field
    }

    pub fn target_field(&self) -> &str {
        &self.target_field
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    pub fn driver_kind(&self) -> DriverKind {
        self.driver_kind
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_endpoint(&self) -> Option<&str> {
        self.api_endpoint.as_deref()
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }
}

/// api_key 只顯示末四碼
pub fn mask_secret(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}

impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorConfig")
            .field("source_field", &self.source_field)
            .field("target_field", &self.target_field)
            .field("instruction", &self.instruction)
            .field("prompt_template", &self.prompt_template)
            .field("driver_kind", &self.driver_kind)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("api_endpoint", &self.api_endpoint)
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("request_timeout", &self.request_timeout)
            .field("metric_name", &self.metric_name)
            .finish()
    }
}
