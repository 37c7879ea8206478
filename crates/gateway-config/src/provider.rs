//! Provider connection facts.

use gateway_core::ProviderId;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenRouter base URL
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Featherless base URL
pub const FEATHERLESS_BASE_URL: &str = "https://api.featherless.ai/v1";

/// What a provider accepts beyond the common parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Accepts a reasoning-effort directive
    #[serde(default)]
    pub reasoning: bool,
    /// Accepts top-k, min-p and repetition-penalty
    #[serde(default)]
    pub extended_sampling: bool,
}

/// Connection facts for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier
    pub id: ProviderId,
    /// Name used in user-facing messages
    pub display_name: String,
    /// Base URL; the chat completions path is appended to it
    pub base_url: String,
    /// Inline credential; takes precedence over `api_key_env`
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Credential key looked up in the credential source
    pub api_key_env: String,
    /// Static headers sent with every call
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    /// Concurrency limit overriding the queue default
    #[serde(default)]
    pub max_concurrent: Option<usize>,
    /// Payload shaping capabilities
    #[serde(default)]
    pub capabilities: ProviderCapabilities,
}

impl ProviderConfig {
    /// Create a provider configuration
    pub fn new(
        id: impl Into<ProviderId>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            base_url: base_url.into(),
            api_key: None,
            api_key_env: api_key_env.into(),
            extra_headers: BTreeMap::new(),
            max_concurrent: None,
            capabilities: ProviderCapabilities::default(),
        }
    }

    /// OpenRouter defaults
    #[must_use]
    pub fn openrouter() -> Self {
        Self::new(
            "openrouter",
            "OpenRouter",
            OPENROUTER_BASE_URL,
            "OPENROUTER_API_KEY",
        )
        .with_capabilities(ProviderCapabilities {
            reasoning: true,
            extended_sampling: false,
        })
        .with_header("HTTP-Referer", "https://localhost:5173")
        .with_header("X-Title", "AI-Chat-Template")
    }

    /// Featherless defaults
    #[must_use]
    pub fn featherless() -> Self {
        Self::new(
            "featherless",
            "Featherless",
            FEATHERLESS_BASE_URL,
            "FEATHERLESS_API_KEY",
        )
        .with_capabilities(ProviderCapabilities {
            reasoning: false,
            extended_sampling: true,
        })
    }

    /// Set an inline credential
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Add a static header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Set the capabilities
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the concurrency limit
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    /// Full chat completions endpoint
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Model listing endpoint
    #[must_use]
    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url.trim_end_matches('/'))
    }
}
