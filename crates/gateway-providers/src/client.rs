//! Chat-completion HTTP client and failure classification.

use crate::registry::ResolvedProvider;
use crate::shaping::ProviderPayload;
use gateway_core::{GatewayError, GatewayResult};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

/// Connect timeout for provider calls; the overall deadline is set per attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Longest provider body quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Build the shared HTTP client
///
/// # Errors
/// Returns error if the TLS backend cannot be initialized
pub fn build_http_client() -> GatewayResult<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(16)
        .build()
        .map_err(|e| {
            GatewayError::configuration(None, format!("Failed to create HTTP client: {e}"))
        })
}

/// One entry of a provider's model catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier sent in payloads
    pub id: String,
    /// Display name; the last path segment of the id when the provider
    /// sends none
    pub name: String,
    /// Provider description, possibly empty
    pub description: String,
    /// Context window in tokens, when reported
    pub context_length: Option<u64>,
    /// Pricing object exactly as the provider sent it
    pub pricing: Option<Value>,
}

impl ModelInfo {
    fn from_value(model: &Value) -> Option<Self> {
        let id = model.get("id").and_then(Value::as_str)?.to_string();
        let name = model
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .map_or_else(
                || id.rsplit('/').next().unwrap_or(&id).to_string(),
                ToString::to_string,
            );
        Some(Self {
            name,
            description: model
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            context_length: model.get("context_length").and_then(Value::as_u64),
            pricing: model.get("pricing").filter(|p| !p.is_null()).cloned(),
            id,
        })
    }
}

/// Sends shaped payloads to OpenAI-compatible chat-completion endpoints
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: Client,
}

impl ChatCompletionClient {
    /// Wrap an existing HTTP client
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Create with a fresh HTTP client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn with_defaults() -> GatewayResult<Self> {
        build_http_client().map(Self::new)
    }

    /// Perform one chat-completion call
    ///
    /// Returns the provider's JSON body unchanged. No retries happen here.
    ///
    /// # Errors
    /// Returns a classified error for transport failures, non-2xx statuses
    /// and unparseable bodies
    pub async fn complete(
        &self,
        provider: &ResolvedProvider,
        payload: &ProviderPayload,
    ) -> GatewayResult<Value> {
        let name = provider.display_name();
        let url = provider.config.completions_url();

        debug!(
            provider = %provider.id(),
            model = %payload.model,
            url = %url,
            "Sending chat completion request"
        );

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(provider.credential.expose_secret())
            .json(payload);
        for (header, value) in &provider.config.extra_headers {
            request = request.header(header.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(name, &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            let error = classify_status(name, status, retry_after, &body);
            warn!(
                provider = %provider.id(),
                status = status.as_u16(),
                retryable = error.is_retryable(),
                error = %error,
                "Provider returned error status"
            );
            return Err(error);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(name, &e))?;
        serde_json::from_slice(&body).map_err(|e| {
            GatewayError::terminal(name, format!("Failed to parse response: {e}"), None)
        })
    }

    /// Fetch the provider's model catalogue
    ///
    /// Entries without an id are skipped and repeated ids keep their first
    /// occurrence.
    ///
    /// # Errors
    /// Returns a classified error for transport failures, non-2xx statuses
    /// and bodies without a `data` array
    pub async fn list_models(&self, provider: &ResolvedProvider) -> GatewayResult<Vec<ModelInfo>> {
        let name = provider.display_name();
        let url = provider.config.models_url();
        debug!(provider = %provider.id(), url = %url, "Listing models");

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(provider.credential.expose_secret());
        for (header, value) in &provider.config.extra_headers {
            request = request.header(header.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(name, &e))?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(name, status, retry_after, &body));
        }

        let body: Value = response.json().await.map_err(|e| {
            GatewayError::terminal(name, format!("Failed to parse model list: {e}"), None)
        })?;
        let entries = body.get("data").and_then(Value::as_array).ok_or_else(|| {
            GatewayError::terminal(name, "Model list response has no data array", None)
        })?;

        let mut seen = HashSet::new();
        Ok(entries
            .iter()
            .filter_map(ModelInfo::from_value)
            .filter(|model| seen.insert(model.id.clone()))
            .collect())
    }
}

/// Classify a non-2xx status
///
/// 429 is rate limiting, 500/502/503/504 are transient, everything else is
/// terminal.
#[must_use]
pub fn classify_status(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> GatewayError {
    let message = error_message(status, body);
    match status.as_u16() {
        429 => GatewayError::rate_limited(provider, message, retry_after),
        code @ (500 | 502 | 503 | 504) => GatewayError::transient(provider, message, Some(code)),
        code => GatewayError::terminal(provider, message, Some(code)),
    }
}

/// Classify a transport-level failure
///
/// Only timeouts, refused connections and resets are transient. Other
/// connect-phase failures (DNS resolution, TLS handshake) are terminal, as
/// are bad URLs and redirect loops.
#[must_use]
pub fn classify_transport_error(provider: &str, error: &reqwest::Error) -> GatewayError {
    let message = error.to_string();
    if error.is_timeout() || has_retryable_io_cause(error) {
        GatewayError::transient(provider, message, None)
    } else {
        GatewayError::terminal(provider, message, None)
    }
}

fn has_retryable_io_cause(error: &(dyn StdError + 'static)) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_error.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// `Retry-After` in seconds, when present
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

// Prefer `error.message` from an OpenAI-style error body, fall back to the
// raw body, then to the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let structured = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("error").filter(|e| e.is_string()))
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    });

    structured
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| truncate(trimmed, MAX_ERROR_BODY_CHARS))
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
