//! Test fixtures and sample data for integration tests

use gateway_core::{ChatMessage, ExtendedSampling, GenerationRequest, LogContext};
use serde_json::{json, Value};

/// Model used by default in the fixtures
pub const TEST_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Reasoning model used in the fixtures
pub const REASONING_MODEL: &str = "deepseek/deepseek-r1";

/// A single-turn chat request for a provider
pub fn simple_request(provider: &str, model: &str) -> GenerationRequest {
    GenerationRequest::builder()
        .provider(provider)
        .model(model)
        .message(ChatMessage::user("Hello, how are you?"))
        .build()
}

/// A roleplay request with a system prompt and prior turns
pub fn roleplay_request(provider: &str, tag: &str) -> GenerationRequest {
    GenerationRequest::builder()
        .provider(provider)
        .model(TEST_MODEL)
        .messages(vec![
            ChatMessage::system("You are Aria, a tavern keeper."),
            ChatMessage::user("Any rooms free tonight?"),
            ChatMessage::assistant("One, up the stairs. Two silver."),
            ChatMessage::user("I'll take it."),
        ])
        .temperature(0.9)
        .max_tokens(300)
        .log_context(LogContext::new(tag).with_names("Aria", "Traveler"))
        .build()
}

/// A request asking for reasoning
pub fn reasoning_request(provider: &str) -> GenerationRequest {
    GenerationRequest::builder()
        .provider(provider)
        .model(REASONING_MODEL)
        .message(ChatMessage::user("Think it through."))
        .reasoning(true)
        .build()
}

/// A request with explicit extended sampling values
pub fn extended_request(provider: &str, extended: ExtendedSampling) -> GenerationRequest {
    GenerationRequest::builder()
        .provider(provider)
        .model("Sao10K/L3-8B-Stheno-v3.2")
        .message(ChatMessage::user("Hello"))
        .extended(extended)
        .build()
}

/// OpenAI-compatible chat completion body
pub fn chat_response(model: &str, content: &str) -> Value {
    json!({
        "id": "gen-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 12,
            "completion_tokens": 8,
            "total_tokens": 20
        }
    })
}

/// Chat completion carrying a separate reasoning field
pub fn reasoning_response(model: &str, content: &str, reasoning: &str) -> Value {
    json!({
        "model": model,
        "choices": [{
            "message": {
                "role": "assistant",
                "content": content,
                "reasoning": reasoning
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 12,
            "completion_tokens": 64,
            "total_tokens": 76,
            "completion_tokens_details": {"reasoning_tokens": 48}
        }
    })
}

/// Chat completion whose whole budget went to reasoning
pub fn empty_reasoning_response(model: &str, reasoning_tokens: u64) -> Value {
    json!({
        "model": model,
        "choices": [{
            "message": {"role": "assistant", "content": ""},
            "finish_reason": "length"
        }],
        "usage": {
            "prompt_tokens": 12,
            "completion_tokens": reasoning_tokens,
            "total_tokens": reasoning_tokens + 12,
            "completion_tokens_details": {"reasoning_tokens": reasoning_tokens}
        }
    })
}

/// OpenAI-style error body
pub fn error_response(message: &str) -> Value {
    json!({
        "error": {
            "message": message,
            "type": "invalid_request_error"
        }
    })
}

/// txt2img response body
pub fn sd_response(images: &[&str]) -> Value {
    json!({
        "images": images,
        "parameters": {},
        "info": "{}"
    })
}
