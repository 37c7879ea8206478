//! Gateway construction.

use crate::gateway::Gateway;
use gateway_config::GatewayConfig;
use gateway_core::{
    CredentialSource, GatewayError, GatewayResult, GenerationSettings, LogSink, NoopLogSink, SettingsSource,
    StaticSettings,
};
use gateway_providers::{
    build_http_client, ChatCompletionClient, ProviderRegistry, StableDiffusionClient, IMAGE_LANE,
};
use gateway_resilience::{
    BoundedRequestQueue, QueueConfig, RetryConfig, RetryPolicy, DEFAULT_CHAT_TIMEOUT,
    DEFAULT_IMAGE_TIMEOUT,
};
use gateway_telemetry::FileLogSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builder for [`Gateway`]
pub struct GatewayBuilder {
    registry: Option<ProviderRegistry>,
    queue: QueueConfig,
    retry: RetryConfig,
    chat_timeout: Duration,
    image_timeout: Duration,
    log_sink: Option<Arc<dyn LogSink>>,
    settings: Option<Arc<dyn SettingsSource>>,
    image_base_url: Option<String>,
    http: Option<reqwest::Client>,
}

impl GatewayBuilder {
    /// Create a builder with default limits, retry schedule and deadlines
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: None,
            queue: QueueConfig::default(),
            retry: RetryConfig::default(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            log_sink: None,
            settings: None,
            image_base_url: None,
            http: None,
        }
    }

    /// Builder preconfigured from a [`GatewayConfig`]
    #[must_use]
    pub fn from_config(config: &GatewayConfig, credentials: Arc<dyn CredentialSource>) -> Self {
        let mut queue = QueueConfig {
            default_max_concurrent: config.queue.default_max_concurrent,
            per_provider: config.concurrency_limits(),
        };
        queue
            .per_provider
            .entry(IMAGE_LANE.to_string())
            .or_insert(config.image.max_concurrent);

        let retry = RetryConfig {
            max_retries: config.retry.max_retries,
            base_delay: config.retry.base_delay,
            max_delay: config.retry.max_delay,
            multiplier: config.retry.multiplier,
            jitter: config.retry.jitter,
        };

        let log_sink: Arc<dyn LogSink> = if config.llm_log.enabled {
            Arc::new(FileLogSink::from_settings(&config.llm_log))
        } else {
            Arc::new(NoopLogSink)
        };

        let settings = StaticSettings(GenerationSettings {
            provider: config.default_provider.clone(),
            ..GenerationSettings::default()
        });

        Self::new()
            .registry(ProviderRegistry::from_config(config, credentials))
            .queue(queue)
            .retry(retry)
            .chat_timeout(config.timeouts.chat)
            .image_timeout(config.timeouts.image)
            .log_sink(log_sink)
            .settings(Arc::new(settings))
            .image_backend(config.image.base_url.clone())
    }

    /// Set the provider registry
    #[must_use]
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the queue limits
    #[must_use]
    pub fn queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Set the retry schedule
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the chat attempt deadline
    #[must_use]
    pub fn chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Set the image attempt deadline
    #[must_use]
    pub fn image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }

    /// Set the prompt/response log sink
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Set the per-caller settings source
    #[must_use]
    pub fn settings(mut self, settings: Arc<dyn SettingsSource>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Enable image generation against a Stable Diffusion server
    #[must_use]
    pub fn image_backend(mut self, base_url: impl Into<String>) -> Self {
        self.image_base_url = Some(base_url.into());
        self
    }

    /// Use an existing HTTP client
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the gateway
    ///
    /// # Errors
    /// - `Configuration` if a chat provider is registered under the image
    ///   lane's id
    /// - the client error if the HTTP client cannot be created
    pub fn build(self) -> GatewayResult<Gateway> {
        let registry = self.registry.unwrap_or_else(ProviderRegistry::with_builtin);
        if registry.provider_ids().iter().any(|id| id.as_str() == IMAGE_LANE) {
            return Err(GatewayError::configuration(
                Some(IMAGE_LANE),
                "provider id is reserved for the image backend",
            ));
        }
        let http = match self.http {
            Some(http) => http,
            None => build_http_client()?,
        };

        info!(
            providers = registry.len(),
            default_provider = %registry.default_provider(),
            max_concurrent = self.queue.default_max_concurrent,
            max_retries = self.retry.max_retries,
            image_backend = self.image_base_url.as_deref().unwrap_or("disabled"),
            "Gateway initialized"
        );

        Ok(Gateway {
            registry: Arc::new(registry),
            queue: Arc::new(BoundedRequestQueue::new(self.queue)),
            retry: RetryPolicy::new(self.retry),
            chat_timeout: self.chat_timeout,
            image_timeout: self.image_timeout,
            client: ChatCompletionClient::new(http.clone()),
            image_client: self
                .image_base_url
                .map(|url| StableDiffusionClient::new(http, url)),
            log_sink: self.log_sink.unwrap_or_else(|| Arc::new(NoopLogSink)),
            settings: self
                .settings
                .unwrap_or_else(|| Arc::new(StaticSettings::default())),
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
