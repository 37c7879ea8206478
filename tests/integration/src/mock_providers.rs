//! Mock providers for integration testing
//!
//! Wiremock servers that speak the OpenAI-compatible chat-completion
//! protocol used by OpenRouter and Featherless, plus an AUTOMATIC1111
//! txt2img endpoint.

use crate::fixtures::{chat_response, error_response, sd_response};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/chat/completions";
const TXT2IMG_PATH: &str = "/sdapi/v1/txt2img";

/// Mock chat-completion provider
pub struct MockChatProvider {
    pub server: MockServer,
}

impl MockChatProvider {
    /// Start a new mock provider
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the provider with
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Number of chat-completion calls received
    pub async fn calls(&self) -> usize {
        self.requests().await.len()
    }

    /// JSON bodies of every chat-completion call received, in order
    pub async fn bodies(&self) -> Vec<Value> {
        self.requests()
            .await
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Every chat-completion call received, in order
    pub async fn requests(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == COMPLETIONS_PATH)
            .collect()
    }

    /// Answer every call with the given content
    pub async fn mock_chat_completion(&self, model: &str, content: &str) {
        self.mock_json(200, chat_response(model, content)).await;
    }

    /// Answer every call with the given content after a delay
    pub async fn mock_chat_completion_delayed(&self, model: &str, content: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response(model, content))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer every call with an arbitrary JSON body
    pub async fn mock_json(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Fail the first `times` calls with `status`, then fall through to
    /// whatever is mounted afterwards
    pub async fn mock_failures(&self, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(error_response(&format!("upstream returned {status}"))),
            )
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Rate limit every call
    pub async fn mock_rate_limit(&self) {
        Mock::given(method("POST"))
            .and(path(COMPLETIONS_PATH))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(error_response("Rate limit exceeded"))
                    .append_header("Retry-After", "60"),
            )
            .mount(&self.server)
            .await;
    }

    /// Reject every call as unauthenticated
    pub async fn mock_auth_error(&self) {
        self.mock_json(401, error_response("Invalid API key")).await;
    }
}

/// Mock Stable Diffusion server
pub struct MockStableDiffusion {
    pub server: MockServer,
}

impl MockStableDiffusion {
    /// Start a new mock backend
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the backend with
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// JSON bodies of every txt2img call received, in order
    pub async fn bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == TXT2IMG_PATH)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Answer every call with the given images
    pub async fn mock_images(&self, images: &[&str]) {
        Mock::given(method("POST"))
            .and(path(TXT2IMG_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sd_response(images)))
            .mount(&self.server)
            .await;
    }

    /// Fail the first `times` calls with `status`
    pub async fn mock_failures(&self, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path(TXT2IMG_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string("busy"))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }
}
