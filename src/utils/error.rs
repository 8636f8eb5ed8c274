use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for configuration field '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 呼叫語言模型後端時發生的錯誤，一律不帶任何部分結果
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend request timed out")]
    Timeout,

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend response: {message}")]
    MalformedResponse { message: String },

    #[error("request cancelled")]
    Cancelled,
}

impl DriverError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// reqwest 的逾時錯誤獨立歸類，其餘視為傳輸失敗
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::malformed(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Io => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::Medium,
        }
    }

    pub fn is_config_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::MissingConfigError { field } => {
                format!("設定檔缺少必要欄位 '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定欄位 '{}' 的值無效：{}", field, reason)
            }
            EtlError::ConfigValidationError { field, message } => {
                format!("設定檔 '{}' 驗證失敗：{}", field, message)
            }
            EtlError::ConfigError { message } => format!("設定錯誤：{}", message),
            EtlError::IoError(e) => format!("檔案讀寫失敗：{}", e),
            EtlError::SerializationError(e) => format!("JSON 格式錯誤：{}", e),
            EtlError::ProcessingError { message } => format!("資料處理失敗：{}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::MissingConfigError { .. } => {
                "Add the missing field to the [processor] section of the config file"
            }
            EtlError::InvalidConfigValueError { .. } => {
                "Check the field value against the documented options"
            }
            EtlError::ConfigValidationError { .. } | EtlError::ConfigError { .. } => {
                "Make sure the config file is valid TOML and all ${VARS} are exported"
            }
            EtlError::IoError(_) => "Check that the input/output paths exist and are accessible",
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                "Make sure every input line is a single JSON object"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
