//! Normalized generation output.

use serde::{Deserialize, Serialize};

/// Token accounting reported by a provider
///
/// Every counter is optional because providers report different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    /// Output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    /// Total tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Output tokens spent on reasoning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

/// Result of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Final text with reasoning tags stripped
    pub content: String,
    /// Text as returned by the provider
    pub raw_content: String,
    /// Extracted reasoning, if any
    pub reasoning: Option<String>,
    /// Model that actually served the call
    pub model: String,
    /// Parsed token counters
    pub usage: Usage,
    /// Usage object exactly as the provider sent it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_usage: Option<serde_json::Value>,
}

impl GenerationResult {
    /// Check whether any reasoning was extracted
    #[must_use]
    pub fn has_reasoning(&self) -> bool {
        self.reasoning.as_deref().is_some_and(|r| !r.is_empty())
    }
}
