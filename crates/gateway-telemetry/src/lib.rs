//! # Gateway Telemetry
//!
//! Observability for the roleplay LLM gateway:
//! - process logging through `tracing-subscriber`
//! - spans for generation calls
//! - a file-backed prompt/response log with per-tag retention

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod llm_log;
pub mod tracing_setup;

pub use llm_log::FileLogSink;
pub use tracing_setup::{build_filter, init_logging, LoggingError};
