//! # Gateway Engine
//!
//! The [`Gateway`] ties the provider registry, the bounded per-provider
//! queue, the retry policy and response normalization into one call.
//!
//! ```no_run
//! use gateway_core::{ChatMessage, GenerationRequest};
//! use gateway_engine::Gateway;
//!
//! # async fn run() -> gateway_core::GatewayResult<()> {
//! let gateway = Gateway::builder().build()?;
//! let request = GenerationRequest::builder()
//!     .provider("openrouter")
//!     .model("anthropic/claude-3.5-sonnet")
//!     .message(ChatMessage::user("Hello"))
//!     .build();
//! let result = gateway.generate(&request).await?;
//! println!("{}", result.content);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod gateway;

pub use builder::GatewayBuilder;
pub use gateway::Gateway;
