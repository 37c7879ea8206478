//! Request types for the gateway.
//!
//! A [`GenerationRequest`] is built once by the caller and only read by the
//! gateway. Provider-specific sampling controls live in
//! [`ExtendedSampling`]; whether they reach the wire is decided by the
//! provider's shaping rule, not by the caller.

use crate::types::ProviderId;
use serde::{Deserialize, Serialize};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt
    System,
    /// Human turn
    User,
    /// Model turn
    Assistant,
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling controls only some providers accept
///
/// Unset fields fall back to the provider defaults when the provider
/// supports extended sampling, and are dropped otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedSampling {
    /// Top-k; `-1` disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    /// Min-p threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
    /// Repetition penalty; `1.0` disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
}

/// Common generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Nucleus sampling
    pub top_p: f32,
    /// Frequency penalty
    pub frequency_penalty: f32,
    /// Presence penalty
    pub presence_penalty: f32,
    /// Ask the provider for extended reasoning
    #[serde(default)]
    pub reasoning_enabled: bool,
    /// Provider-specific sampling extension
    #[serde(default)]
    pub extended: ExtendedSampling,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            reasoning_enabled: false,
            extended: ExtendedSampling::default(),
        }
    }
}

/// Tagging forwarded to the prompt/response log sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    /// Log category (e.g. `chat`, `regenerate`, `impersonate`)
    pub tag: String,
    /// Name shown for assistant turns
    pub character_name: String,
    /// Name shown for user turns
    pub user_name: String,
}

impl LogContext {
    /// Create a context with default participant names
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the participant names
    #[must_use]
    pub fn with_names(
        mut self,
        character_name: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        self.character_name = character_name.into();
        self.user_name = user_name.into();
        self
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self {
            tag: "generation".to_string(),
            character_name: "LLM".to_string(),
            user_name: "System".to_string(),
        }
    }
}

/// A single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    provider: ProviderId,
    model: String,
    messages: Vec<ChatMessage>,
    params: GenerationParams,
    log_context: LogContext,
}

impl GenerationRequest {
    /// Create a request with default parameters
    pub fn new(
        provider: impl Into<ProviderId>,
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            messages,
            params: GenerationParams::default(),
            log_context: LogContext::default(),
        }
    }

    /// Create a new builder for `GenerationRequest`
    #[must_use]
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    /// Replace the generation parameters
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Replace the log context
    #[must_use]
    pub fn with_log_context(mut self, log_context: LogContext) -> Self {
        self.log_context = log_context;
        self
    }

    /// Selected provider
    #[must_use]
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Requested model
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Conversation to send
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Generation parameters
    #[must_use]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Log sink tagging
    #[must_use]
    pub fn log_context(&self) -> &LogContext {
        &self.log_context
    }
}

/// Builder for `GenerationRequest`
#[derive(Debug, Default)]
pub struct GenerationRequestBuilder {
    provider: Option<ProviderId>,
    model: Option<String>,
    messages: Vec<ChatMessage>,
    params: GenerationParams,
    log_context: LogContext,
}

impl GenerationRequestBuilder {
    /// Set the provider
    #[must_use]
    pub fn provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add a message
    #[must_use]
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the messages
    #[must_use]
    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = temperature;
        self
    }

    /// Set max_tokens
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = max_tokens;
        self
    }

    /// Set top_p
    #[must_use]
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.params.top_p = top_p;
        self
    }

    /// Set frequency_penalty
    #[must_use]
    pub fn frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.params.frequency_penalty = frequency_penalty;
        self
    }

    /// Set presence_penalty
    #[must_use]
    pub fn presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.params.presence_penalty = presence_penalty;
        self
    }

    /// Enable extended reasoning
    #[must_use]
    pub fn reasoning(mut self, enabled: bool) -> Self {
        self.params.reasoning_enabled = enabled;
        self
    }

    /// Set the extended sampling controls
    #[must_use]
    pub fn extended(mut self, extended: ExtendedSampling) -> Self {
        self.params.extended = extended;
        self
    }

    /// Set the log context
    #[must_use]
    pub fn log_context(mut self, log_context: LogContext) -> Self {
        self.log_context = log_context;
        self
    }

    /// Build the request
    ///
    /// An unset provider resolves to the registry default; an unset model is
    /// sent as an empty string and left to the provider to reject.
    #[must_use]
    pub fn build(self) -> GenerationRequest {
        GenerationRequest {
            provider: self.provider.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            messages: self.messages,
            params: self.params,
            log_context: self.log_context,
        }
    }
}
