//! Test helper utilities for integration tests

use gateway_config::ProviderConfig;
use gateway_core::StaticCredentials;
use gateway_engine::{Gateway, GatewayBuilder};
use gateway_providers::ProviderRegistry;
use gateway_resilience::RetryConfig;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Credential handed to every mock provider
pub const TEST_API_KEY: &str = "sk-test-key";

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Retry schedule with the default budget and millisecond delays
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        ..RetryConfig::default()
    }
}

/// OpenRouter pointed at a mock server
pub fn openrouter_at(url: &str) -> ProviderConfig {
    ProviderConfig::openrouter().with_base_url(url)
}

/// Featherless pointed at a mock server
pub fn featherless_at(url: &str) -> ProviderConfig {
    ProviderConfig::featherless().with_base_url(url)
}

/// Registry holding the given providers, each with a test credential
pub fn test_registry(providers: Vec<ProviderConfig>) -> ProviderRegistry {
    let credentials = providers
        .iter()
        .fold(StaticCredentials::new(), |creds, p| {
            creds.with(p.api_key_env.clone(), TEST_API_KEY)
        });
    let mut registry = ProviderRegistry::new("openrouter", Arc::new(credentials));
    for provider in providers {
        registry.register_config(provider);
    }
    registry
}

/// Builder preloaded with the given providers and fast retries
pub fn test_builder(providers: Vec<ProviderConfig>) -> GatewayBuilder {
    init_tracing();
    Gateway::builder()
        .registry(test_registry(providers))
        .retry(fast_retry())
}

/// Gateway with the given providers and fast retries
pub fn test_gateway(providers: Vec<ProviderConfig>) -> Gateway {
    test_builder(providers)
        .build()
        .expect("Failed to build gateway")
}
