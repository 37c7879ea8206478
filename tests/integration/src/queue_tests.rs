//! Per-provider queue tests
//!
//! Providers answer slowly so the queue state can be observed while calls
//! are in flight.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use futures::future::join_all;
use gateway_resilience::QueueConfig;
use std::time::Duration;

const SLOW: Duration = Duration::from_millis(400);

#[tokio::test]
async fn test_provider_lane_admits_at_most_three() {
    let mock = MockChatProvider::new().await;
    mock.mock_chat_completion_delayed(TEST_MODEL, "slow", SLOW)
        .await;

    let gateway = test_gateway(vec![openrouter_at(&mock.url())]);
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway
                    .generate(&simple_request("openrouter", TEST_MODEL))
                    .await
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(150)).await;
    let stats = gateway.queue_stats(&"openrouter".into());
    assert_eq!(stats.max_concurrent, 3);
    assert_eq!(stats.running, 3);
    assert_eq!(stats.queued, 2);
    assert_eq!(mock.calls().await, 3);

    for result in join_all(handles).await {
        assert_eq!(result.unwrap().unwrap().content, "slow");
    }
    let stats = gateway.queue_stats(&"openrouter".into());
    assert_eq!(stats.running, 0);
    assert_eq!(stats.queued, 0);
    assert_eq!(mock.calls().await, 5);
}

#[tokio::test]
async fn test_lanes_are_independent() {
    let slow = MockChatProvider::new().await;
    slow.mock_chat_completion_delayed(TEST_MODEL, "slow", SLOW)
        .await;
    let fast = MockChatProvider::new().await;
    fast.mock_chat_completion("Sao10K/L3-8B-Stheno-v3.2", "fast")
        .await;

    let gateway = test_builder(vec![openrouter_at(&slow.url()), featherless_at(&fast.url())])
        .queue(QueueConfig::default().with_limit("openrouter", 1))
        .build()
        .unwrap();

    let blocked: Vec<_> = (0..2)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway
                    .generate(&simple_request("openrouter", TEST_MODEL))
                    .await
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stats = gateway.queue_stats(&"openrouter".into());
    assert_eq!(stats.running, 1);
    assert_eq!(stats.queued, 1);

    // A saturated OpenRouter lane does not hold up Featherless
    let result = tokio::time::timeout(
        Duration::from_millis(300),
        gateway.generate(&simple_request("featherless", "Sao10K/L3-8B-Stheno-v3.2")),
    )
    .await
    .expect("featherless call should not wait on openrouter")
    .unwrap();
    assert_eq!(result.content, "fast");

    for result in join_all(blocked).await {
        assert!(result.unwrap().is_ok());
    }
}

#[tokio::test]
async fn test_slot_is_held_across_retries() {
    let mock = MockChatProvider::new().await;
    mock.mock_failures(503, 2).await;
    mock.mock_chat_completion(TEST_MODEL, "ok").await;

    let gateway = test_builder(vec![openrouter_at(&mock.url())])
        .queue(QueueConfig::default().with_limit("openrouter", 1))
        .build()
        .unwrap();

    let first_request = simple_request("openrouter", TEST_MODEL);
    let second_request = simple_request("openrouter", TEST_MODEL);
    let (first, second) = tokio::join!(
        gateway.generate(&first_request),
        gateway.generate(&second_request),
    );

    assert_eq!(first.unwrap().content, "ok");
    assert_eq!(second.unwrap().content, "ok");
    // Both failures land on the first admitted call; the second never
    // overlaps it
    assert_eq!(mock.calls().await, 4);
}

#[tokio::test]
async fn test_failed_call_releases_its_slot() {
    let mock = MockChatProvider::new().await;
    mock.mock_auth_error().await;

    let gateway = test_builder(vec![openrouter_at(&mock.url())])
        .queue(QueueConfig::default().with_limit("openrouter", 1))
        .build()
        .unwrap();

    for _ in 0..3 {
        assert!(gateway
            .generate(&simple_request("openrouter", TEST_MODEL))
            .await
            .is_err());
    }
    let stats = gateway.queue_stats(&"openrouter".into());
    assert_eq!(stats.running, 0);
    assert_eq!(stats.queued, 0);
}
