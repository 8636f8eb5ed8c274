#[cfg(feature = "cli")]
pub mod cli;
pub mod processor;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use processor::{DriverKind, ProcessorConfig, ProcessorSettings};
pub use toml_config::TomlConfig;
