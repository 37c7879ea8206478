//! Prompt/response logging through the gateway

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_telemetry::FileLogSink;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn read_dir_sorted(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}

#[tokio::test]
async fn test_prompt_and_response_files_are_paired() {
    let dir = TempDir::new().unwrap();
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(
        REASONING_MODEL,
        "<think>Be warm.</think>The room is yours.",
    )
    .await;

    let sink = Arc::new(FileLogSink::new(dir.path(), 5));
    let gateway = test_builder(vec![openrouter_at(&mock.url())])
        .log_sink(sink.clone())
        .build()
        .unwrap();
    gateway
        .generate(&roleplay_request("openrouter", "chat"))
        .await
        .unwrap();

    let prompts = read_dir_sorted(sink.prompts_dir()).await;
    let responses = read_dir_sorted(sink.responses_dir()).await;
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts, responses);
    assert!(prompts[0].starts_with("chat-"));

    let prompt = tokio::fs::read_to_string(sink.prompts_dir().join(&prompts[0]))
        .await
        .unwrap();
    assert!(prompt.contains("You are Aria, a tavern keeper."));
    assert!(prompt.contains("Traveler: Any rooms free tonight?"));
    assert!(prompt.contains("Aria: One, up the stairs. Two silver."));

    let response = tokio::fs::read_to_string(sink.responses_dir().join(&responses[0]))
        .await
        .unwrap();
    assert!(response.contains("Be warm."));
    assert!(response.contains("<think>Be warm.</think>The room is yours."));
    assert!(response.contains("The room is yours."));
}

#[tokio::test]
async fn test_old_logs_are_pruned_per_tag() {
    let dir = TempDir::new().unwrap();
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion(TEST_MODEL, "ok").await;

    let sink = Arc::new(FileLogSink::new(dir.path(), 2));
    let gateway = test_builder(vec![openrouter_at(&mock.url())])
        .log_sink(sink.clone())
        .build()
        .unwrap();

    for _ in 0..4 {
        gateway
            .generate(&roleplay_request("openrouter", "chat"))
            .await
            .unwrap();
    }
    gateway
        .generate(&roleplay_request("openrouter", "impersonate"))
        .await
        .unwrap();

    let prompts = read_dir_sorted(sink.prompts_dir()).await;
    let chat = prompts.iter().filter(|n| n.starts_with("chat-")).count();
    let impersonate = prompts
        .iter()
        .filter(|n| n.starts_with("impersonate-"))
        .count();
    assert_eq!(chat, 2);
    assert_eq!(impersonate, 1);
    assert_eq!(read_dir_sorted(sink.responses_dir()).await.len(), 3);
}

#[tokio::test]
async fn test_failed_call_leaves_only_the_prompt() {
    let dir = TempDir::new().unwrap();
    let mock = MockChatProvider::new().await;
    mock.mock_auth_error().await;

    let sink = Arc::new(FileLogSink::new(dir.path(), 5));
    let gateway = test_builder(vec![openrouter_at(&mock.url())])
        .log_sink(sink.clone())
        .build()
        .unwrap();
    assert!(gateway
        .generate(&roleplay_request("openrouter", "chat"))
        .await
        .is_err());

    assert_eq!(read_dir_sorted(sink.prompts_dir()).await.len(), 1);
    let responses = match tokio::fs::try_exists(sink.responses_dir()).await {
        Ok(true) => read_dir_sorted(sink.responses_dir()).await,
        _ => Vec::new(),
    };
    assert!(responses.is_empty());
}
