//! # Gateway Core
//!
//! Core types, traits, and error handling for the roleplay LLM gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Generation request and result types
//! - The classified error taxonomy
//! - Interfaces of the external collaborators (log sink, settings, credentials)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod request;
pub mod response;
pub mod settings;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use request::{
    ChatMessage, ExtendedSampling, GenerationParams, GenerationRequest,
    GenerationRequestBuilder, LogContext, MessageRole,
};
pub use response::{GenerationResult, Usage};
pub use settings::{
    CredentialSource, EnvCredentials, GenerationSettings, ParamOverrides, SettingsSource,
    StaticCredentials, StaticSettings,
};
pub use sink::{LogId, LogSink, NoopLogSink, ResponseRecord, SinkError};
pub use types::ProviderId;
