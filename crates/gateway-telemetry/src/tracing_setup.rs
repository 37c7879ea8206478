//! Process logging setup.
//!
//! Human-readable or JSON output through `tracing-subscriber`. `RUST_LOG`
//! takes precedence over the configured level.

use gateway_config::LoggingSettings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the global subscriber
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let filter = build_filter(&settings.level);

    let fmt_layer = if settings.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

/// Filter from `RUST_LOG`, falling back to `level`
#[must_use]
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to install the subscriber
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

/// Create a span for one generation call
#[macro_export]
macro_rules! generation_span {
    ($provider:expr, $model:expr, $tag:expr) => {
        tracing::info_span!(
            "generation",
            provider = %$provider,
            model = %$model,
            tag = %$tag
        )
    };
}

/// Create a span for one image generation call
#[macro_export]
macro_rules! image_span {
    ($seed:expr) => {
        tracing::info_span!("image_generation", seed = $seed)
    };
}
