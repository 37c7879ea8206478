//! Response normalization.
//!
//! Providers return text in slightly different shapes and some embed the
//! model's reasoning in `<think>` tags. Normalization yields the final text,
//! the reasoning (if any) and token usage, and turns an empty final text
//! into an [`GatewayError::EmptyOutput`] error.

use gateway_core::{GatewayError, GatewayResult, GenerationResult, Usage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static THINK_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<think>(.*?)</think>").unwrap());

static THINK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?think>").unwrap());

/// Message for an empty response without reasoning tokens
pub const EMPTY_RESPONSE_MESSAGE: &str = "Model returned empty response";

/// Fields pulled out of a raw provider response, before the emptiness check
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    /// Final text, stripped of reasoning tags
    pub content: String,
    /// Text as returned by the provider
    pub raw_content: String,
    /// Reasoning from a dedicated field or an inline think block
    pub reasoning: Option<String>,
    /// Serving model
    pub model: String,
    /// Parsed usage
    pub usage: Usage,
    /// Usage exactly as sent
    pub raw_usage: Option<Value>,
}

impl NormalizedResponse {
    /// Extract content, reasoning and usage from a raw response
    ///
    /// Never fails: missing fields become empty values.
    #[must_use]
    pub fn extract(raw: &Value, requested_model: &str) -> Self {
        let raw_content = primary_text(raw).unwrap_or_default();

        let reasoning = reasoning_field(raw).or_else(|| inline_reasoning(&raw_content));
        let content = strip_think_tags(&raw_content);

        let model = raw
            .get("model")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(requested_model)
            .to_string();

        let raw_usage = raw.get("usage").filter(|u| u.is_object()).cloned();
        let usage = raw_usage.as_ref().map(parse_usage).unwrap_or_default();

        Self {
            content,
            raw_content,
            reasoning,
            model,
            usage,
            raw_usage,
        }
    }

    /// Check that some final text was produced
    ///
    /// # Errors
    /// Returns [`GatewayError::EmptyOutput`] when the final text is empty,
    /// naming the reasoning token count when the provider reported one
    pub fn into_result(self) -> GatewayResult<GenerationResult> {
        if self.content.is_empty() {
            let reasoning_tokens = self.usage.reasoning_tokens.filter(|n| *n > 0);
            let message = reasoning_tokens.map_or_else(
                || EMPTY_RESPONSE_MESSAGE.to_string(),
                |n| {
                    format!(
                        "Model used {n} tokens on reasoning but produced no output. \
                         Try increasing max tokens in settings."
                    )
                },
            );
            return Err(GatewayError::empty_output(reasoning_tokens, message));
        }

        Ok(GenerationResult {
            content: self.content,
            raw_content: self.raw_content,
            reasoning: self.reasoning,
            model: self.model,
            usage: self.usage,
            raw_usage: self.raw_usage,
        })
    }
}

/// Normalize a raw provider response in one step
///
/// # Errors
/// Returns [`GatewayError::EmptyOutput`] when no final text remains
pub fn normalize(raw: &Value, requested_model: &str) -> GatewayResult<GenerationResult> {
    NormalizedResponse::extract(raw, requested_model).into_result()
}

/// Remove every think block and stray think tag, then trim
#[must_use]
pub fn strip_think_tags(text: &str) -> String {
    let without_blocks = THINK_BLOCK.replace_all(text, "");
    let trimmed = without_blocks.trim();
    THINK_TAG.replace_all(trimmed, "").trim().to_string()
}

/// Contents of the first think block, trimmed
#[must_use]
pub fn inline_reasoning(text: &str) -> Option<String> {
    THINK_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|r| !r.is_empty())
}

// choices[0].message.content (string or text parts), then choices[0].text,
// then Gemini-style candidates[0].content.parts.
fn primary_text(raw: &Value) -> Option<String> {
    let choice = raw.pointer("/choices/0");

    choice
        .and_then(|c| c.pointer("/message/content"))
        .and_then(content_text)
        .or_else(|| {
            choice
                .and_then(|c| c.get("text"))
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .or_else(|| {
            raw.pointer("/candidates/0/content/parts")
                .and_then(content_text)
        })
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!texts.is_empty()).then(|| texts.concat())
        }
        _ => None,
    }
}

fn reasoning_field(raw: &Value) -> Option<String> {
    let message = raw.pointer("/choices/0/message")?;
    ["reasoning", "reasoning_content"]
        .iter()
        .filter_map(|key| message.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|r| !r.is_empty())
        .map(ToString::to_string)
}

fn parse_usage(usage: &Value) -> Usage {
    let counter = |pointer: &str| usage.pointer(pointer).and_then(Value::as_u64);
    // Nested detail first, then the flat field some providers send.
    let nested_reasoning = counter("/completion_tokens_details/reasoning_tokens");
    Usage {
        prompt_tokens: counter("/prompt_tokens"),
        completion_tokens: counter("/completion_tokens"),
        total_tokens: counter("/total_tokens"),
        reasoning_tokens: nested_reasoning
            .filter(|n| *n > 0)
            .or_else(|| counter("/reasoning_tokens"))
            .or(nested_reasoning),
    }
}
