//! Top-level gateway configuration.

use crate::error::ConfigError;
use crate::provider::ProviderConfig;
use gateway_core::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default Stable Diffusion server
pub const DEFAULT_SD_URL: &str = "http://127.0.0.1:7860";

/// Queue lane of the image backend; reserved, so no chat provider may use it
pub const IMAGE_LANE: &str = "stable-diffusion";

/// Complete gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Default provider for requests that name none
    pub default_provider: ProviderId,
    /// Known chat providers
    pub providers: Vec<ProviderConfig>,
    /// Admission control
    pub queue: QueueSettings,
    /// Retry schedule
    pub retry: RetrySettings,
    /// Per-attempt deadlines
    pub timeouts: TimeoutSettings,
    /// Prompt/response log sink
    pub llm_log: LlmLogSettings,
    /// Process logging
    pub logging: LoggingSettings,
    /// Image generation backend
    pub image: ImageBackendSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderId::new("openrouter"),
            providers: vec![ProviderConfig::openrouter(), ProviderConfig::featherless()],
            queue: QueueSettings::default(),
            retry: RetrySettings::default(),
            timeouts: TimeoutSettings::default(),
            llm_log: LlmLogSettings::default(),
            logging: LoggingSettings::default(),
            image: ImageBackendSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Look up a provider by id
    #[must_use]
    pub fn provider(&self, id: &ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| &p.id == id)
    }

    /// Concurrency limits for every provider that overrides the default
    ///
    /// Keys are normalized like provider ids, so `OpenRouter` and
    /// `openrouter` name the same lane.
    #[must_use]
    pub fn concurrency_limits(&self) -> HashMap<String, usize> {
        let mut limits: HashMap<String, usize> = self
            .queue
            .per_provider
            .iter()
            .map(|(name, max)| (ProviderId::new(name).to_string(), *max))
            .collect();
        for provider in &self.providers {
            if let Some(max) = provider.max_concurrent {
                limits.insert(provider.id.to_string(), max);
            }
        }
        limits
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns the first invalid value found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.default_max_concurrent == 0 {
            return Err(ConfigError::invalid(
                "queue.default_max_concurrent",
                "must be at least 1",
            ));
        }
        if let Some((name, _)) = self.concurrency_limits().iter().find(|(_, max)| **max == 0) {
            return Err(ConfigError::invalid(
                format!("max_concurrent[{name}]"),
                "must be at least 1",
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "retry.multiplier",
                "must be at least 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::invalid("retry.jitter", "must be within 0.0-1.0"));
        }
        if self.timeouts.chat.is_zero() || self.timeouts.image.is_zero() {
            return Err(ConfigError::invalid("timeouts", "must be non-zero"));
        }
        if self.llm_log.keep_per_tag == 0 {
            return Err(ConfigError::invalid("llm_log.keep_per_tag", "must be at least 1"));
        }

        for provider in &self.providers {
            if provider.id.is_empty() {
                return Err(ConfigError::invalid("providers.id", "must not be empty"));
            }
            if provider.id.as_str() == IMAGE_LANE {
                return Err(ConfigError::invalid(
                    "providers.id",
                    format!("'{IMAGE_LANE}' is reserved for the image backend"),
                ));
            }
            Url::parse(&provider.base_url).map_err(|e| {
                ConfigError::invalid(format!("providers[{}].base_url", provider.id), e.to_string())
            })?;
        }
        Url::parse(&self.image.base_url)
            .map_err(|e| ConfigError::invalid("image.base_url", e.to_string()))?;

        if self.provider(&self.default_provider).is_none() {
            return Err(ConfigError::invalid(
                "default_provider",
                format!("'{}' is not a configured provider", self.default_provider),
            ));
        }
        Ok(())
    }
}

/// Admission control settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Concurrent calls allowed per provider unless overridden
    pub default_max_concurrent: usize,
    /// Per-provider overrides, keyed by provider id
    pub per_provider: HashMap<String, usize>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            default_max_concurrent: 3,
            per_provider: HashMap::new(),
        }
    }
}

/// Retry schedule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Growth factor between retries
    pub multiplier: f64,
    /// Cap on a single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Random spread applied to each delay (0.0 - 1.0)
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.0,
        }
    }
}

/// Per-attempt deadlines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Chat completion attempt
    #[serde(with = "humantime_serde")]
    pub chat: Duration,
    /// Image generation attempt
    #[serde(with = "humantime_serde")]
    pub image: Duration,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            chat: Duration::from_secs(120),
            image: Duration::from_secs(300),
        }
    }
}

/// Prompt/response log sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmLogSettings {
    /// Record prompts and responses at all
    pub enabled: bool,
    /// Root directory; `prompts/` and `responses/` are created below it
    pub directory: PathBuf,
    /// Files kept per tag in each directory
    pub keep_per_tag: usize,
}

impl Default for LlmLogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("logs"),
            keep_per_tag: 5,
        }
    }
}

/// Process logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level filter, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Image generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBackendSettings {
    /// Stable Diffusion WebUI base URL
    pub base_url: String,
    /// Concurrent txt2img calls
    pub max_concurrent: usize,
}

impl Default for ImageBackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SD_URL.to_string(),
            max_concurrent: 1,
        }
    }
}
