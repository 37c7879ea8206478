//! The gateway: one entry point for queued, retried, normalized generation.
//!
//! A chat call runs as: resolve provider, shape payload, record prompt,
//! then inside the provider's queue lane the retry loop around single
//! deadline-bounded HTTP attempts, then normalization. One queue slot is
//! held across all attempts of a call.

use crate::builder::GatewayBuilder;
use gateway_config::GatewayConfig;
use gateway_core::{
    ChatMessage, CredentialSource, GatewayError, GatewayResult, GenerationRequest,
    GenerationResult, LogContext, LogId, LogSink, ParamOverrides, ProviderId, ResponseRecord,
    SettingsSource,
};
use gateway_providers::{
    decode_image, ChatCompletionClient, ImageRequest, ImageResult, ModelInfo, NormalizedResponse,
    ProviderRegistry, StableDiffusionClient, Txt2ImgPayload, IMAGE_BACKEND_NAME, IMAGE_LANE,
};
use gateway_resilience::{with_deadline, BoundedRequestQueue, QueueStats, RetryPolicy};
use gateway_telemetry::{generation_span, image_span};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Multi-provider generation gateway
///
/// Cheap to clone; clones share the registry, queue and sinks.
#[derive(Clone)]
pub struct Gateway {
    pub(crate) registry: Arc<ProviderRegistry>,
    pub(crate) queue: Arc<BoundedRequestQueue>,
    pub(crate) retry: RetryPolicy,
    pub(crate) chat_timeout: Duration,
    pub(crate) image_timeout: Duration,
    pub(crate) client: ChatCompletionClient,
    pub(crate) image_client: Option<StableDiffusionClient>,
    pub(crate) log_sink: Arc<dyn LogSink>,
    pub(crate) settings: Arc<dyn SettingsSource>,
}

impl Gateway {
    /// Create a builder
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Build a gateway from configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn from_config(
        config: &GatewayConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> GatewayResult<Self> {
        GatewayBuilder::from_config(config, credentials).build()
    }

    /// Provider registry
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Check if image generation is configured
    #[must_use]
    pub fn has_image_backend(&self) -> bool {
        self.image_client.is_some()
    }

    /// Generate a chat completion
    ///
    /// Fails fast, before anything is queued or sent, when the provider is
    /// unknown or has no credential.
    ///
    /// # Errors
    /// - `Configuration` for unknown providers or missing credentials
    /// - `TerminalProvider` for non-retryable failures or exhausted retries
    /// - `EmptyOutput` when the provider produced no final text
    pub async fn generate(&self, request: &GenerationRequest) -> GatewayResult<GenerationResult> {
        let provider = self.registry.resolve(request.provider())?;
        let payload = self.registry.shape_payload(request)?;
        let context = request.log_context();

        let span = generation_span!(provider.id(), payload.model, context.tag);
        async {
            let log_id = self.record_request(request.messages(), context).await;

            let started = Instant::now();
            let raw = self
                .queue
                .enqueue(
                    provider.id().as_str(),
                    self.retry.execute(|| {
                        with_deadline(
                            provider.display_name(),
                            self.chat_timeout,
                            self.client.complete(&provider, &payload),
                        )
                    }),
                )
                .await?;

            let normalized = NormalizedResponse::extract(&raw, request.model());
            if let Some(id) = log_id {
                self.record_response(&id, context, &normalized, &raw).await;
            }
            let result = normalized.into_result()?;

            info!(
                served_model = %result.model,
                elapsed_ms = started.elapsed().as_millis() as u64,
                completion_tokens = ?result.usage.completion_tokens,
                has_reasoning = result.has_reasoning(),
                "Generation completed"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Generate with the caller's stored settings, overridden per call
    ///
    /// # Errors
    /// Same as [`Gateway::generate`]
    pub async fn generate_with_settings(
        &self,
        caller: &str,
        messages: Vec<ChatMessage>,
        overrides: ParamOverrides,
        log_context: LogContext,
    ) -> GatewayResult<GenerationResult> {
        let settings = overrides.apply(self.settings.settings_for(caller).await);
        let request = GenerationRequest::new(settings.provider, settings.model, messages)
            .with_params(settings.params)
            .with_log_context(log_context);
        self.generate(&request).await
    }

    /// One user prompt with the caller's stored settings; returns the text
    ///
    /// # Errors
    /// Same as [`Gateway::generate`]
    pub async fn complete_simple(&self, caller: &str, prompt: &str) -> GatewayResult<String> {
        self.generate_with_settings(
            caller,
            vec![ChatMessage::user(prompt)],
            ParamOverrides::default(),
            LogContext::default(),
        )
        .await
        .map(|result| result.content)
    }

    /// Model catalogue of a provider; empty ids mean the default provider
    ///
    /// Not queued or retried.
    ///
    /// # Errors
    /// - `Configuration` for unknown providers or missing credentials
    /// - the classified provider error otherwise
    pub async fn list_models(&self, provider: &ProviderId) -> GatewayResult<Vec<ModelInfo>> {
        let provider = self.registry.resolve(provider)?;
        let models = self.client.list_models(&provider).await?;
        debug!(provider = %provider.id(), count = models.len(), "Listed models");
        Ok(models)
    }

    /// Check that the image backend is configured and reachable
    pub async fn image_backend_healthy(&self) -> bool {
        match &self.image_client {
            Some(client) => client.health().await,
            None => false,
        }
    }

    /// Checkpoints installed on the image backend
    ///
    /// # Errors
    /// `Configuration` when no image backend is configured, otherwise the
    /// classified backend error
    pub async fn image_models(&self) -> GatewayResult<Vec<String>> {
        self.image_client()?.models().await
    }

    /// Samplers offered by the image backend
    ///
    /// # Errors
    /// `Configuration` when no image backend is configured, otherwise the
    /// classified backend error
    pub async fn image_samplers(&self) -> GatewayResult<Vec<String>> {
        self.image_client()?.samplers().await
    }

    fn image_client(&self) -> GatewayResult<&StableDiffusionClient> {
        self.image_client.as_ref().ok_or_else(|| {
            GatewayError::configuration(None, "Image generation backend not configured")
        })
    }

    /// Generate an image through the Stable Diffusion lane
    ///
    /// # Errors
    /// - `Configuration` when no image backend is configured
    /// - `EmptyOutput` when the backend returns no image
    /// - `TerminalProvider` for non-retryable failures or exhausted retries
    pub async fn generate_image(&self, request: &ImageRequest) -> GatewayResult<ImageResult> {
        let client = self.image_client()?;
        let payload = Txt2ImgPayload::from_request(request);

        let span = image_span!(payload.seed);
        async {
            let started = Instant::now();
            let image = self
                .queue
                .enqueue(
                    IMAGE_LANE,
                    self.retry.execute(|| {
                        with_deadline(
                            IMAGE_BACKEND_NAME,
                            self.image_timeout,
                            client.txt2img(&payload),
                        )
                    }),
                )
                .await?;

            let result = decode_image(image, &payload, started.elapsed())?;
            info!(
                bytes = result.image.len(),
                elapsed_ms = result.generation_time.as_millis() as u64,
                "Image generated"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Queue counters for a provider; empty ids mean the default provider
    #[must_use]
    pub fn queue_stats(&self, provider: &ProviderId) -> QueueStats {
        self.queue
            .stats(self.registry.effective_id(provider).as_str())
    }

    /// Queue counters for the image lane
    #[must_use]
    pub fn image_queue_stats(&self) -> QueueStats {
        self.queue.stats(IMAGE_LANE)
    }

    async fn record_request(&self, messages: &[ChatMessage], context: &LogContext) -> Option<LogId> {
        match self.log_sink.record_request(messages, context).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Failed to record prompt");
                None
            }
        }
    }

    async fn record_response(
        &self,
        id: &LogId,
        context: &LogContext,
        normalized: &NormalizedResponse,
        raw: &serde_json::Value,
    ) {
        let record = ResponseRecord {
            context,
            normalized_text: &normalized.content,
            raw_text: &normalized.raw_content,
            reasoning: normalized.reasoning.as_deref(),
            metadata: raw,
        };
        if let Err(e) = self.log_sink.record_response(id, record).await {
            warn!(error = %e, "Failed to record response");
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("registry", &self.registry)
            .field("retry", &self.retry)
            .field("chat_timeout", &self.chat_timeout)
            .field("image_timeout", &self.image_timeout)
            .field("image_backend", &self.image_client.as_ref().map(StableDiffusionClient::base_url))
            .finish_non_exhaustive()
    }
}
