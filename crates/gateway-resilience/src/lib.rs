//! # Gateway Resilience
//!
//! Resilience patterns for the roleplay LLM gateway:
//! - Bounded per-provider request queue with FIFO admission
//! - Retry policy with exponential backoff
//! - Per-attempt deadlines

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod queue;
pub mod retry;
pub mod timeout;

// Re-export main types
pub use queue::{BoundedRequestQueue, QueueConfig, QueueStats, DEFAULT_MAX_CONCURRENT};
pub use retry::{RetryConfig, RetryPolicy, RetryResult};
pub use timeout::{with_deadline, DEFAULT_CHAT_TIMEOUT, DEFAULT_IMAGE_TIMEOUT};
