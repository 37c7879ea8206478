//! Image generation through the Stable Diffusion lane

use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::ErrorKind;
use gateway_providers::ImageRequest;

// "hello" in base64
const IMAGE_B64: &str = "aGVsbG8=";

#[tokio::test]
async fn test_image_is_generated_and_decoded() {
    let sd = MockStableDiffusion::new().await;
    sd.mock_images(&[IMAGE_B64]).await;

    let gateway = test_builder(vec![])
        .image_backend(sd.url())
        .build()
        .unwrap();
    let result = gateway
        .generate_image(&ImageRequest::new("1girl, tavern, candlelight").with_seed(42))
        .await
        .unwrap();

    assert_eq!(result.image, b"hello");
    assert_eq!(result.image_base64, IMAGE_B64);
    assert_eq!(result.seed, 42);
    assert_eq!(result.prompt, "1girl, tavern, candlelight");

    let body = &sd.bodies().await[0];
    assert_eq!(body["seed"], 42);
    assert_eq!(body["width"], 832);
    assert_eq!(body["height"], 1216);
    assert_eq!(body["sampler_name"], "DPM++ 2M");
    assert_eq!(body["enable_hr"], true);
}

#[tokio::test]
async fn test_image_backend_errors_are_retried() {
    let sd = MockStableDiffusion::new().await;
    sd.mock_failures(503, 1).await;
    sd.mock_images(&[IMAGE_B64]).await;

    let gateway = test_builder(vec![])
        .image_backend(sd.url())
        .build()
        .unwrap();
    let result = gateway
        .generate_image(&ImageRequest::new("castle at dusk"))
        .await
        .unwrap();

    assert_eq!(result.image, b"hello");
    assert_eq!(sd.bodies().await.len(), 2);
}

#[tokio::test]
async fn test_no_images_is_empty_output() {
    let sd = MockStableDiffusion::new().await;
    sd.mock_images(&[]).await;

    let gateway = test_builder(vec![])
        .image_backend(sd.url())
        .build()
        .unwrap();
    let err = gateway
        .generate_image(&ImageRequest::new("nothing"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyOutput);
    assert_eq!(err.to_string(), "No images returned from SD server");
    assert_eq!(sd.bodies().await.len(), 1);
}

#[tokio::test]
async fn test_image_lane_is_separate_from_chat() {
    let sd = MockStableDiffusion::new().await;
    sd.mock_images(&[IMAGE_B64]).await;

    let gateway = test_builder(vec![])
        .image_backend(sd.url())
        .build()
        .unwrap();
    gateway
        .generate_image(&ImageRequest::new("forest"))
        .await
        .unwrap();

    assert_eq!(gateway.image_queue_stats().running, 0);
    assert_eq!(gateway.queue_stats(&"openrouter".into()).running, 0);
}
