//! Prompt/response log sink interface.
//!
//! The gateway records every outbound prompt and inbound response through a
//! [`LogSink`]. Recording is best-effort: a failing sink never fails the
//! generation call. Storage and retention belong to the sink.

use crate::request::{ChatMessage, LogContext};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Identifier pairing a prompt record with its response record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogId(String);

impl LogId {
    /// Wrap a sink-specific identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure inside a log sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the record failed
    #[error("log sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The record could not be rendered
    #[error("log sink serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What the gateway knows about a response when it is recorded
#[derive(Debug, Clone)]
pub struct ResponseRecord<'a> {
    /// Log tagging of the originating request
    pub context: &'a LogContext,
    /// Text after reasoning tags were stripped
    pub normalized_text: &'a str,
    /// Text exactly as the provider returned it
    pub raw_text: &'a str,
    /// Extracted reasoning, if any
    pub reasoning: Option<&'a str>,
    /// Full provider response body
    pub metadata: &'a serde_json::Value,
}

/// External prompt/response log collaborator
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Record an outbound prompt and return the id to pair its response with
    async fn record_request(
        &self,
        messages: &[ChatMessage],
        context: &LogContext,
    ) -> Result<LogId, SinkError>;

    /// Record the response for a previously recorded prompt
    async fn record_response(
        &self,
        id: &LogId,
        record: ResponseRecord<'_>,
    ) -> Result<(), SinkError>;
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

#[async_trait]
impl LogSink for NoopLogSink {
    async fn record_request(
        &self,
        _messages: &[ChatMessage],
        context: &LogContext,
    ) -> Result<LogId, SinkError> {
        Ok(LogId::new(context.tag.clone()))
    }

    async fn record_response(
        &self,
        _id: &LogId,
        _record: ResponseRecord<'_>,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}
