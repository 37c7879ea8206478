//! End-to-end generation tests
//!
//! Payload shaping per provider, headers, and normalization of what comes
//! back.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{ChatMessage, ErrorKind, ExtendedSampling, LogContext, ParamOverrides};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_openrouter_request_carries_auth_and_headers() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(TEST_MODEL, "Hi!").await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    gateway
        .generate(&roleplay_request("openrouter", "chat"))
        .await
        .unwrap();

    let requests = mock.requests().await;
    assert_eq!(requests.len(), 1);
    let headers = &requests[0].headers;
    assert_eq!(
        headers.get("authorization").unwrap().to_str().unwrap(),
        format!("Bearer {TEST_API_KEY}")
    );
    assert_eq!(
        headers.get("x-title").unwrap().to_str().unwrap(),
        "AI-Chat-Template"
    );
}

#[tokio::test]
async fn test_openrouter_payload_shape() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(TEST_MODEL, "Hi!").await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    gateway
        .generate(&roleplay_request("openrouter", "chat"))
        .await
        .unwrap();

    let body = &mock.bodies().await[0];
    assert_eq!(body["model"], TEST_MODEL);
    assert_eq!(body["max_tokens"], 300);
    assert_eq!(body["messages"].as_array().unwrap().len(), 4);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][2]["role"], "assistant");
    assert!(body.get("reasoning").is_none());
    assert!(body.get("top_k").is_none());
}

#[tokio::test]
async fn test_openrouter_reasoning_directive() {
    let mock = MockChatProvider::new().await;
    mock.mock_json(
        200,
        reasoning_response(REASONING_MODEL, "The answer is 4.", "2 + 2 = 4"),
    )
    .await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    let result = gateway
        .generate(&reasoning_request("openrouter"))
        .await
        .unwrap();

    let body = &mock.bodies().await[0];
    assert_eq!(body["reasoning"], json!({"effort": "medium"}));

    assert_eq!(result.content, "The answer is 4.");
    assert_eq!(result.reasoning.as_deref(), Some("2 + 2 = 4"));
    assert_eq!(result.usage.reasoning_tokens, Some(48));
    assert!(result.raw_usage.is_some());
}

#[tokio::test]
async fn test_featherless_gets_extended_sampling_defaults() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion("Sao10K/L3-8B-Stheno-v3.2", "Hello!")
        .await;

    let gateway = test_gateway(vec![featherless_at(&mock.url())]);
    gateway
        .generate(&reasoning_request("featherless"))
        .await
        .unwrap();

    let body = &mock.bodies().await[0];
    assert_eq!(body["top_k"], -1);
    assert_eq!(body["min_p"], 0.0);
    assert_eq!(body["repetition_penalty"], 1.0);
    // Featherless has no reasoning support, so the flag is dropped
    assert!(body.get("reasoning").is_none());
}

#[tokio::test]
async fn test_featherless_honors_explicit_sampling() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion("Sao10K/L3-8B-Stheno-v3.2", "Hello!")
        .await;

    let gateway = test_gateway(vec![featherless_at(&mock.url())]);
    gateway
        .generate(&extended_request(
            "featherless",
            ExtendedSampling {
                top_k: Some(40),
                min_p: None,
                repetition_penalty: Some(1.5),
            },
        ))
        .await
        .unwrap();

    let body = &mock.bodies().await[0];
    assert_eq!(body["top_k"], 40);
    assert_eq!(body["min_p"], 0.0);
    assert_eq!(body["repetition_penalty"], 1.5);
}

#[tokio::test]
async fn test_think_tags_are_split_from_content() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(
        REASONING_MODEL,
        "<think>She seems tired.</think>Here is your key.",
    )
    .await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    let result = gateway
        .generate(&simple_request("openrouter", REASONING_MODEL))
        .await
        .unwrap();

    assert_eq!(result.content, "Here is your key.");
    assert_eq!(result.reasoning.as_deref(), Some("She seems tired."));
    assert!(result.raw_content.starts_with("<think>"));
    assert_eq!(result.model, REASONING_MODEL);
}

#[tokio::test]
async fn test_empty_output_names_reasoning_tokens() {
    let mock = MockChatProvider::new().await;
    mock.mock_json(200, empty_reasoning_response(REASONING_MODEL, 500))
        .await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    let err = gateway
        .generate(&reasoning_request("openrouter"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyOutput);
    assert_eq!(
        err.to_string(),
        "Model used 500 tokens on reasoning but produced no output. \
         Try increasing max tokens in settings."
    );
    // Empty output is not retried
    assert_eq!(mock.calls().await, 1);
}

#[tokio::test]
async fn test_only_think_block_is_empty_output() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(REASONING_MODEL, "<think>hmm</think>")
        .await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    let err = gateway
        .generate(&simple_request("openrouter", REASONING_MODEL))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyOutput);
    assert_eq!(err.to_string(), "Model returned empty response");
}

#[tokio::test]
async fn test_empty_provider_uses_default() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(TEST_MODEL, "Default route").await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    let result = gateway
        .generate(&simple_request("", TEST_MODEL))
        .await
        .unwrap();

    assert_eq!(result.content, "Default route");
    assert_eq!(mock.calls().await, 1);
}

#[tokio::test]
async fn test_overrides_route_to_another_provider() {
    let openrouter = MockChatProvider::new().await;
    let featherless = MockChatProvider::new().await;
    featherless
        .mock_chat_completion("Sao10K/L3-8B-Stheno-v3.2", "From Featherless")
        .await;

    let gateway = test_gateway(vec![
        openrouter_at(&openrouter.url()),
        featherless_at(&featherless.url()),
    ]);
    let result = gateway
        .generate_with_settings(
            "user-1",
            vec![ChatMessage::user("Hello")],
            ParamOverrides {
                provider: Some("featherless".into()),
                model: Some("Sao10K/L3-8B-Stheno-v3.2".to_string()),
                temperature: Some(1.1),
                ..ParamOverrides::default()
            },
            LogContext::new("chat"),
        )
        .await
        .unwrap();

    assert_eq!(result.content, "From Featherless");
    assert_eq!(openrouter.calls().await, 0);
    let body = &featherless.bodies().await[0];
    assert_eq!(body["model"], "Sao10K/L3-8B-Stheno-v3.2");
    assert_eq!(body["top_k"], -1);
}
