//! Integration tests for the roleplay LLM gateway
//!
//! Every test drives a real [`gateway_engine::Gateway`] against wiremock
//! servers standing in for the chat-completion providers and the Stable
//! Diffusion backend:
//! - Retry and failure classification
//! - Payload shaping per provider
//! - Response normalization
//! - Per-provider queue limits
//! - Prompt/response logging and image generation

pub mod fixtures;
pub mod helpers;
pub mod mock_providers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod generation_tests;
#[cfg(test)]
mod image_tests;
#[cfg(test)]
mod logging_tests;
#[cfg(test)]
mod queue_tests;
