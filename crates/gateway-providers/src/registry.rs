//! Provider registry.
//!
//! Maps provider ids to their connection facts and shaping rule. The
//! registry is built once at startup and only read afterwards.

use crate::shaping::{PayloadShaper, ProviderPayload, StandardShaper};
use gateway_config::{GatewayConfig, ProviderConfig};
use gateway_core::{
    CredentialSource, EnvCredentials, GatewayError, GatewayResult, GenerationRequest, ProviderId,
};
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Registered provider with its shaping rule
#[derive(Clone)]
pub struct ProviderEntry {
    /// Connection facts
    pub config: Arc<ProviderConfig>,
    /// Body shaping rule
    pub shaper: Arc<dyn PayloadShaper>,
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Provider ready to be called
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    /// Connection facts
    pub config: Arc<ProviderConfig>,
    /// Credential sent as bearer token
    pub credential: SecretString,
}

impl ResolvedProvider {
    /// Provider id
    #[must_use]
    pub fn id(&self) -> &ProviderId {
        &self.config.id
    }

    /// Name used in error messages
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.config.display_name
    }
}

/// Registry of chat providers
pub struct ProviderRegistry {
    entries: HashMap<ProviderId, ProviderEntry>,
    default_provider: ProviderId,
    credentials: Arc<dyn CredentialSource>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new(
        default_provider: impl Into<ProviderId>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            default_provider: default_provider.into(),
            credentials,
        }
    }

    /// Registry holding every provider of `config`
    #[must_use]
    pub fn from_config(config: &GatewayConfig, credentials: Arc<dyn CredentialSource>) -> Self {
        let mut registry = Self::new(config.default_provider.clone(), credentials);
        for provider in &config.providers {
            registry.register_config(provider.clone());
        }
        registry
    }

    /// Registry with the built-in providers, reading keys from the environment
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::from_config(&GatewayConfig::default(), Arc::new(EnvCredentials))
    }

    /// Register a provider with a custom shaping rule
    ///
    /// Replaces any provider registered under the same id.
    pub fn register(&mut self, config: ProviderConfig, shaper: Arc<dyn PayloadShaper>) {
        debug!(provider = %config.id, base_url = %config.base_url, "Registering provider");
        self.entries.insert(
            config.id.clone(),
            ProviderEntry {
                config: Arc::new(config),
                shaper,
            },
        );
    }

    /// Register a provider shaped according to its capabilities
    pub fn register_config(&mut self, config: ProviderConfig) {
        let shaper = Arc::new(StandardShaper::new(config.capabilities));
        self.register(config, shaper);
    }

    /// Provider used when a request names none
    #[must_use]
    pub fn default_provider(&self) -> &ProviderId {
        &self.default_provider
    }

    /// Ids of all registered providers
    #[must_use]
    pub fn provider_ids(&self) -> Vec<&ProviderId> {
        let mut ids: Vec<_> = self.entries.keys().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Number of registered providers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no provider is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id a request is routed to; empty ids mean the default provider
    #[must_use]
    pub fn effective_id<'a>(&'a self, id: &'a ProviderId) -> &'a ProviderId {
        if id.is_empty() {
            &self.default_provider
        } else {
            id
        }
    }

    /// Look up a provider entry
    ///
    /// # Errors
    /// Returns a configuration error for unknown providers
    pub fn entry(&self, id: &ProviderId) -> GatewayResult<&ProviderEntry> {
        let id = self.effective_id(id);
        self.entries.get(id).ok_or_else(|| {
            GatewayError::configuration(Some(id.as_str()), format!("Unknown provider '{id}'"))
        })
    }

    /// Resolve a provider and its credential
    ///
    /// An inline key wins over the credential source.
    ///
    /// # Errors
    /// Returns a configuration error for unknown providers or missing keys
    pub fn resolve(&self, id: &ProviderId) -> GatewayResult<ResolvedProvider> {
        let entry = self.entry(id)?;
        let config = &entry.config;

        let credential = config
            .api_key
            .clone()
            .or_else(|| self.credentials.credential(&config.api_key_env))
            .ok_or_else(|| {
                GatewayError::configuration(
                    Some(config.id.as_str()),
                    format!("{} API key not configured", config.display_name),
                )
            })?;

        Ok(ResolvedProvider {
            config: Arc::clone(config),
            credential,
        })
    }

    /// Build the request body for the request's provider
    ///
    /// # Errors
    /// Returns a configuration error for unknown providers
    pub fn shape_payload(&self, request: &GenerationRequest) -> GatewayResult<ProviderPayload> {
        let entry = self.entry(request.provider())?;
        Ok(entry.shaper.shape(request))
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_ids())
            .field("default_provider", &self.default_provider)
            .finish_non_exhaustive()
    }
}
