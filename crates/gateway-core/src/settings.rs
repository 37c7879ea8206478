//! Per-caller default generation settings and credential lookup.
//!
//! Both are external collaborators: the gateway reads them, it never owns
//! their storage.

use crate::request::{ExtendedSampling, GenerationParams};
use crate::types::ProviderId;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Provider, model and parameters a caller generates with by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider to call
    pub provider: ProviderId,
    /// Model to request
    pub model: String,
    /// Generation parameters
    #[serde(flatten)]
    pub params: GenerationParams,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderId::new("openrouter"),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            params: GenerationParams::default(),
        }
    }
}

/// Caller-supplied values that take precedence over [`GenerationSettings`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ParamOverrides {
    pub provider: Option<ProviderId>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub reasoning_enabled: Option<bool>,
    pub top_k: Option<i32>,
    pub min_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
}

impl ParamOverrides {
    /// Merge onto a set of defaults
    #[must_use]
    pub fn apply(self, base: GenerationSettings) -> GenerationSettings {
        let GenerationSettings {
            provider,
            model,
            params,
        } = base;
        let extended = ExtendedSampling {
            top_k: self.top_k.or(params.extended.top_k),
            min_p: self.min_p.or(params.extended.min_p),
            repetition_penalty: self
                .repetition_penalty
                .or(params.extended.repetition_penalty),
        };

        GenerationSettings {
            provider: self.provider.unwrap_or(provider),
            model: self.model.unwrap_or(model),
            params: GenerationParams {
                temperature: self.temperature.unwrap_or(params.temperature),
                max_tokens: self.max_tokens.unwrap_or(params.max_tokens),
                top_p: self.top_p.unwrap_or(params.top_p),
                frequency_penalty: self.frequency_penalty.unwrap_or(params.frequency_penalty),
                presence_penalty: self.presence_penalty.unwrap_or(params.presence_penalty),
                reasoning_enabled: self.reasoning_enabled.unwrap_or(params.reasoning_enabled),
                extended,
            },
        }
    }
}

/// Source of per-caller default settings
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Settings for a caller; callers without stored settings get defaults
    async fn settings_for(&self, caller: &str) -> GenerationSettings;
}

/// Settings source returning the same settings for everyone
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub GenerationSettings);

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn settings_for(&self, _caller: &str) -> GenerationSettings {
        self.0.clone()
    }
}

/// Source of provider credentials, keyed by variable name
pub trait CredentialSource: Send + Sync {
    /// Look up a credential; `None` when it is absent or blank
    fn credential(&self, key: &str) -> Option<SecretString>;
}

/// Reads credentials from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credential(&self, key: &str) -> Option<SecretString> {
        std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::new)
    }
}

/// In-memory credentials, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Create an empty credential set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn credential(&self, key: &str) -> Option<SecretString> {
        self.values
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::new(v.clone()))
    }
}
