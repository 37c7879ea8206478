//! # Gateway Config
//!
//! Configuration for the roleplay LLM gateway: provider connection facts,
//! queue limits, retry schedule, deadlines and log settings, loaded from
//! TOML or YAML with environment overrides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod gateway;
pub mod loader;
pub mod provider;

pub use error::ConfigError;
pub use gateway::{
    GatewayConfig, ImageBackendSettings, LlmLogSettings, LoggingSettings, QueueSettings,
    RetrySettings, TimeoutSettings, DEFAULT_SD_URL, IMAGE_LANE,
};
pub use loader::{apply_env_overrides, load_config, load_from_file, parse_config};
pub use provider::{ProviderCapabilities, ProviderConfig};
