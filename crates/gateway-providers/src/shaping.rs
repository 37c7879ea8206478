//! Provider-specific payload shaping.
//!
//! Every provider receives the common chat-completion fields. Reasoning and
//! extended sampling controls are added only for providers whose shaping
//! rule supports them; a request flag the provider cannot honor is dropped
//! silently.

use gateway_config::ProviderCapabilities;
use gateway_core::{ChatMessage, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-k sent when the request leaves it unset (disabled)
pub const DEFAULT_TOP_K: i32 = -1;

/// Min-p sent when the request leaves it unset
pub const DEFAULT_MIN_P: f32 = 0.0;

/// Repetition penalty sent when the request leaves it unset (disabled)
pub const DEFAULT_REPETITION_PENALTY: f32 = 1.0;

/// Reasoning effort requested from providers that support it
pub const REASONING_EFFORT: ReasoningEffort = ReasoningEffort::Medium;

/// Reasoning effort level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    /// Low effort
    Low,
    /// Medium effort
    Medium,
    /// High effort
    High,
}

/// `reasoning` object of the chat-completion body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningDirective {
    /// Requested effort
    pub effort: ReasoningEffort,
}

/// Extended sampling fields, flattened into the body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingExtensions {
    /// Top-k
    pub top_k: i32,
    /// Min-p
    pub min_p: f32,
    /// Repetition penalty
    pub repetition_penalty: f32,
}

/// Chat-completion request body sent to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    /// Requested model
    pub model: String,
    /// Conversation
    pub messages: Vec<ChatMessage>,
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
    /// Reasoning directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningDirective>,
    /// Extended sampling controls
    #[serde(flatten)]
    pub sampling: Option<SamplingExtensions>,
    /// Additional fields contributed by custom shaping rules
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProviderPayload {
    /// Payload carrying only the common fields
    #[must_use]
    pub fn common(request: &GenerationRequest) -> Self {
        let params = request.params();
        Self {
            model: request.model().to_string(),
            messages: request.messages().to_vec(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            reasoning: None,
            sampling: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Turns a generation request into a provider's request body
pub trait PayloadShaper: Send + Sync {
    /// Shape the request body; must not fail
    fn shape(&self, request: &GenerationRequest) -> ProviderPayload;
}

/// Shaping rule driven by [`ProviderCapabilities`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardShaper {
    capabilities: ProviderCapabilities,
}

impl StandardShaper {
    /// Create a shaper for the given capabilities
    #[must_use]
    pub fn new(capabilities: ProviderCapabilities) -> Self {
        Self { capabilities }
    }
}

impl PayloadShaper for StandardShaper {
    fn shape(&self, request: &GenerationRequest) -> ProviderPayload {
        let params = request.params();
        let mut payload = ProviderPayload::common(request);

        if params.reasoning_enabled && self.capabilities.reasoning {
            payload.reasoning = Some(ReasoningDirective {
                effort: REASONING_EFFORT,
            });
        }

        if self.capabilities.extended_sampling {
            let extended = params.extended;
            payload.sampling = Some(SamplingExtensions {
                top_k: extended.top_k.unwrap_or(DEFAULT_TOP_K),
                min_p: extended.min_p.unwrap_or(DEFAULT_MIN_P),
                repetition_penalty: extended
                    .repetition_penalty
                    .unwrap_or(DEFAULT_REPETITION_PENALTY),
            });
        }

        payload
    }
}

impl<F> PayloadShaper for F
where
    F: Fn(&GenerationRequest) -> ProviderPayload + Send + Sync,
{
    fn shape(&self, request: &GenerationRequest) -> ProviderPayload {
        self(request)
    }
}
