//! Error types for the gateway.
//!
//! Every failure surfaced to a caller is a classified [`GatewayError`]. The
//! retry policy only looks at [`GatewayError::is_retryable`]; everything else
//! propagates unchanged.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Classification of a gateway failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing credential or unknown provider
    Configuration,
    /// Connection reset/refused, timeout, or a retryable 5xx status
    TransientNetwork,
    /// HTTP 429 from the provider
    RateLimited,
    /// Provider answered but produced no text
    EmptyOutput,
    /// Any other provider failure, or retries exhausted
    TerminalProvider,
}

impl ErrorKind {
    /// Stable lowercase name, used in log fields
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::TransientNetwork => "transient-network",
            Self::RateLimited => "rate-limited",
            Self::EmptyOutput => "empty-output",
            Self::TerminalProvider => "terminal-provider-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified gateway failure
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Configuration gap; never retried
    #[error("Configuration error: {message}")]
    Configuration {
        /// Provider the configuration belongs to, if known
        provider: Option<String>,
        /// Human-readable message
        message: String,
    },

    /// Transport failure or retryable server status
    #[error("{provider} request failed: {message}")]
    TransientNetwork {
        /// Provider identifier
        provider: String,
        /// Human-readable message
        message: String,
        /// HTTP status, absent for transport-level failures
        status_code: Option<u16>,
    },

    /// The provider rate limited the call (HTTP 429)
    #[error("{provider} rate limit exceeded: {message}")]
    RateLimited {
        /// Provider identifier
        provider: String,
        /// Human-readable message
        message: String,
        /// `Retry-After` hint sent by the provider
        retry_after: Option<Duration>,
    },

    /// Successful response without any generated text
    #[error("{message}")]
    EmptyOutput {
        /// Reasoning tokens reported by the provider, when non-zero
        reasoning_tokens: Option<u64>,
        /// Human-readable message
        message: String,
    },

    /// Non-retryable provider failure, or retries exhausted
    #[error("{provider} error: {message}")]
    TerminalProvider {
        /// Provider identifier
        provider: String,
        /// Human-readable message
        message: String,
        /// Last HTTP status seen, if any
        status_code: Option<u16>,
        /// Number of attempts made before giving up
        attempts: u32,
    },
}

impl GatewayError {
    /// Create a configuration error
    pub fn configuration(provider: Option<&str>, message: impl Into<String>) -> Self {
        Self::Configuration {
            provider: provider.map(ToString::to_string),
            message: message.into(),
        }
    }

    /// Create a transient network error
    pub fn transient(
        provider: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::TransientNetwork {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(
        provider: impl Into<String>,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
            retry_after,
        }
    }

    /// Create an empty output error
    pub fn empty_output(reasoning_tokens: Option<u64>, message: impl Into<String>) -> Self {
        Self::EmptyOutput {
            reasoning_tokens,
            message: message.into(),
        }
    }

    /// Create a terminal provider error for a single failed attempt
    pub fn terminal(
        provider: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::TerminalProvider {
            provider: provider.into(),
            message: message.into(),
            status_code,
            attempts: 1,
        }
    }

    /// Get the error classification
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::TransientNetwork { .. } => ErrorKind::TransientNetwork,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::EmptyOutput { .. } => ErrorKind::EmptyOutput,
            Self::TerminalProvider { .. } => ErrorKind::TerminalProvider,
        }
    }

    /// Check if another attempt may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork | ErrorKind::RateLimited
        )
    }

    /// Underlying HTTP status code, when one was received
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::TransientNetwork { status_code, .. }
            | Self::TerminalProvider { status_code, .. } => *status_code,
            Self::RateLimited { .. } => Some(429),
            Self::Configuration { .. } | Self::EmptyOutput { .. } => None,
        }
    }

    /// Provider the error belongs to, if any
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Configuration { provider, .. } => provider.as_deref(),
            Self::TransientNetwork { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::TerminalProvider { provider, .. } => Some(provider),
            Self::EmptyOutput { .. } => None,
        }
    }

    /// The bare message, without the kind prefix added by `Display`
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration { message, .. }
            | Self::TransientNetwork { message, .. }
            | Self::RateLimited { message, .. }
            | Self::EmptyOutput { message, .. }
            | Self::TerminalProvider { message, .. } => message,
        }
    }

    /// Convert a retryable error into the terminal error reported once the
    /// retry budget is spent.
    #[must_use]
    pub fn into_exhausted(self, attempts: u32) -> Self {
        match self {
            Self::TransientNetwork {
                provider,
                message,
                status_code,
            } => Self::TerminalProvider {
                message: format!("{message} (gave up after {attempts} attempts)"),
                provider,
                status_code,
                attempts,
            },
            Self::RateLimited {
                provider, message, ..
            } => Self::TerminalProvider {
                message: format!("{message} (gave up after {attempts} attempts)"),
                provider,
                status_code: Some(429),
                attempts,
            },
            other => other,
        }
    }
}
