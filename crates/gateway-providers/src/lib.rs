//! # Gateway Providers
//!
//! Provider side of the roleplay LLM gateway:
//! - a registry mapping provider ids to connection facts and shaping rules
//! - payload shaping for OpenRouter, Featherless and custom rules
//! - a chat-completion HTTP client that classifies failures
//! - response normalization (think tags, reasoning fields, empty output)
//! - a Stable Diffusion txt2img client

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod image;
pub mod normalize;
pub mod registry;
pub mod shaping;

pub use client::{
    build_http_client, classify_status, classify_transport_error, parse_retry_after,
    ChatCompletionClient, ModelInfo,
};
pub use image::{
    decode_image, HighresFix, ImageRequest, ImageResult, StableDiffusionClient, Txt2ImgPayload,
    HEALTH_TIMEOUT, IMAGE_BACKEND_NAME, IMAGE_LANE, LISTING_TIMEOUT,
};
pub use normalize::{normalize, strip_think_tags, NormalizedResponse};
pub use registry::{ProviderEntry, ProviderRegistry, ResolvedProvider};
pub use shaping::{
    PayloadShaper, ProviderPayload, ReasoningDirective, ReasoningEffort, SamplingExtensions,
    StandardShaper,
};
