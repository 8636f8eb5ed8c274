use crate::config::processor::{ProcessorConfig, ProcessorSettings};
use crate::core::engine::DEFAULT_CONCURRENT_REQUESTS;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_one_of, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: Option<PipelineInfo>,
    pub processor: ProcessorSettings,
    pub runtime: Option<RuntimeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub concurrent_requests: Option<usize>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證並產生不可變的處理器設定
    pub fn processor_config(&self) -> Result<ProcessorConfig> {
        let config = ProcessorConfig::from_settings(&self.processor)?;

        // 沒被替換的 ${VAR} 代表環境變數沒設定
        if config.api_key().starts_with("${") {
            return Err(EtlError::ConfigValidationError {
                field: "processor.api_key".to_string(),
                message: format!("environment variable {} is not set", config.api_key()),
            });
        }

        Ok(config)
    }

    pub fn pipeline_name(&self) -> &str {
        self.pipeline
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("llm-field-etl")
    }

    pub fn concurrent_requests(&self) -> usize {
        self.runtime
            .as_ref()
            .and_then(|r| r.concurrent_requests)
            .unwrap_or(DEFAULT_CONCURRENT_REQUESTS)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.runtime.as_ref().and_then(|r| r.log_level.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.processor_config()?;

        validate_range("runtime.concurrent_requests", self.concurrent_requests(), 1, 100)?;

        if let Some(level) = self.log_level() {
            validate_one_of(
                "runtime.log_level",
                level,
                &["trace", "debug", "info", "warn", "error"],
            )?;
        }

        Ok(())
    }
}
