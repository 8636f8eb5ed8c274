pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::drivers::{
    build_driver, AzureCompletionBackend, LegacyHttpBackend, OpenAiChatBackend,
};
pub use adapters::metrics::AtomicCounter;
pub use config::{DriverKind, ProcessorConfig, ProcessorSettings, TomlConfig};
pub use crate::core::{engine::TransformEngine, field_transform::FieldTransform, prompt::PromptBuilder};
pub use domain::model::{Record, Value};
pub use domain::ports::{Driver, MetricCounter, RecordProcessor};
pub use utils::error::{DriverError, EtlError, Result};
