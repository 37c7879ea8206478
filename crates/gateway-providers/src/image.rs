//! Stable Diffusion txt2img client.

use crate::client::{classify_status, classify_transport_error, parse_retry_after};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gateway_core::{GatewayError, GatewayResult};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub use gateway_config::IMAGE_LANE;

/// Name used in image-backend error messages
pub const IMAGE_BACKEND_NAME: &str = "Stable Diffusion";

/// Negative prompt used when none is given
pub const DEFAULT_NEGATIVE_PROMPT: &str = "lowres, bad anatomy, bad hands, text, error, cropped, \
    worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, \
    blurry, speech bubble, multiple views";

/// Deadline for the backend health check
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for model and sampler listings
pub const LISTING_TIMEOUT: Duration = Duration::from_secs(10);

// Seeds stay within a positive i32, which every SD backend accepts.
const MAX_SEED: i64 = 2_147_483_647;

/// Second, upscaled sampling pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighresFix {
    /// Upscale factor
    pub scale: f32,
    /// Upscaler name
    pub upscaler: String,
    /// Steps of the second pass
    pub steps: u32,
    /// Denoising strength of the second pass
    pub denoising_strength: f32,
}

impl Default for HighresFix {
    fn default() -> Self {
        Self {
            scale: 1.5,
            upscaler: "Latent".to_string(),
            steps: 15,
            denoising_strength: 0.7,
        }
    }
}

/// Image generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRequest {
    /// Positive prompt
    pub prompt: String,
    /// Negative prompt
    pub negative_prompt: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Sampling steps
    pub steps: u32,
    /// Classifier-free guidance scale
    pub cfg_scale: f32,
    /// Sampler name
    pub sampler: String,
    /// Scheduler name
    pub scheduler: String,
    /// Fixed seed; a random one is drawn when absent
    pub seed: Option<i64>,
    /// Checkpoint to switch to for this request
    pub checkpoint: Option<String>,
    /// High-res fix, disabled when absent
    pub highres: Option<HighresFix>,
}

impl Default for ImageRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            width: 832,
            height: 1216,
            steps: 30,
            cfg_scale: 7.0,
            sampler: "DPM++ 2M".to_string(),
            scheduler: "Karras".to_string(),
            seed: None,
            checkpoint: None,
            highres: Some(HighresFix::default()),
        }
    }
}

impl ImageRequest {
    /// Request with default settings
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Request whose prompt joins the non-blank parts with `", "`
    #[must_use]
    pub fn from_parts(parts: &[&str]) -> Self {
        let prompt = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(prompt)
    }

    /// Set the negative prompt
    #[must_use]
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    /// Set the seed
    #[must_use]
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the checkpoint override
    #[must_use]
    pub fn with_checkpoint(mut self, checkpoint: impl Into<String>) -> Self {
        self.checkpoint = Some(checkpoint.into());
        self
    }

    /// Enable or disable the high-res fix
    #[must_use]
    pub fn with_highres(mut self, highres: Option<HighresFix>) -> Self {
        self.highres = highres;
        self
    }
}

/// `override_settings` object of a txt2img body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSettings {
    /// Checkpoint title
    pub sd_model_checkpoint: String,
}

/// High-res fields of a txt2img body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighresPayload {
    /// Always true when present
    pub enable_hr: bool,
    /// Upscale factor
    pub hr_scale: f32,
    /// Upscaler
    pub hr_upscaler: String,
    /// Second-pass steps
    pub hr_second_pass_steps: u32,
    /// Denoising strength
    pub denoising_strength: f32,
}

/// Body posted to `/sdapi/v1/txt2img`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Txt2ImgPayload {
    /// Positive prompt
    pub prompt: String,
    /// Negative prompt
    pub negative_prompt: String,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
    /// Steps
    pub steps: u32,
    /// Guidance scale
    pub cfg_scale: f32,
    /// Sampler
    pub sampler_name: String,
    /// Scheduler
    pub scheduler: String,
    /// Seed actually used
    pub seed: i64,
    /// Images per batch
    pub batch_size: u32,
    /// Number of batches
    pub n_iter: u32,
    /// Return images in the response
    pub send_images: bool,
    /// Keep images on the server
    pub save_images: bool,
    /// Checkpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_settings: Option<OverrideSettings>,
    /// High-res fix
    #[serde(flatten)]
    pub highres: Option<HighresPayload>,
}

impl Txt2ImgPayload {
    /// Build the body, drawing a random seed when the request has none
    #[must_use]
    pub fn from_request(request: &ImageRequest) -> Self {
        let seed = request
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..MAX_SEED));

        Self {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            width: request.width,
            height: request.height,
            steps: request.steps,
            cfg_scale: request.cfg_scale,
            sampler_name: request.sampler.clone(),
            scheduler: request.scheduler.clone(),
            seed,
            batch_size: 1,
            n_iter: 1,
            send_images: true,
            save_images: false,
            override_settings: request
                .checkpoint
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| OverrideSettings {
                    sd_model_checkpoint: c.to_string(),
                }),
            highres: request.highres.as_ref().map(|hr| HighresPayload {
                enable_hr: true,
                hr_scale: hr.scale,
                hr_upscaler: hr.upscaler.clone(),
                hr_second_pass_steps: hr.steps,
                denoising_strength: hr.denoising_strength,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// Generated image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    /// Image as returned by the backend
    pub image_base64: String,
    /// Decoded image bytes
    pub image: Vec<u8>,
    /// Prompt used
    pub prompt: String,
    /// Negative prompt used
    pub negative_prompt: String,
    /// Seed used
    pub seed: i64,
    /// Wall time from first attempt to result
    pub generation_time: Duration,
}

/// Client for an AUTOMATIC1111-compatible txt2img endpoint
#[derive(Debug, Clone)]
pub struct StableDiffusionClient {
    http: Client,
    base_url: String,
}

impl StableDiffusionClient {
    /// Create a client for `base_url`
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Backend base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full txt2img endpoint
    #[must_use]
    pub fn txt2img_url(&self) -> String {
        self.api_url("txt2img")
    }

    /// Check that the backend answers its model listing within
    /// [`HEALTH_TIMEOUT`]
    pub async fn health(&self) -> bool {
        let url = self.api_url("sd-models");
        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(url = %url, error = %e, "SD server health check failed");
                false
            }
        }
    }

    /// Checkpoints installed on the backend, by title
    ///
    /// # Errors
    /// Returns a classified error on transport or status failures
    pub async fn models(&self) -> GatewayResult<Vec<String>> {
        let entries = self.get_listing("sd-models").await?;
        Ok(entries
            .iter()
            .filter_map(|m| {
                m.get("title")
                    .or_else(|| m.get("model_name"))
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            })
            .collect())
    }

    /// Sampler names offered by the backend
    ///
    /// # Errors
    /// Returns a classified error on transport or status failures
    pub async fn samplers(&self) -> GatewayResult<Vec<String>> {
        let entries = self.get_listing("samplers").await?;
        Ok(entries
            .iter()
            .filter_map(|s| s.get("name").and_then(Value::as_str).map(ToString::to_string))
            .collect())
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/sdapi/v1/{endpoint}", self.base_url.trim_end_matches('/'))
    }

    async fn get_listing(&self, endpoint: &str) -> GatewayResult<Vec<Value>> {
        let url = self.api_url(endpoint);
        debug!(url = %url, "Fetching SD listing");

        let response = self
            .http
            .get(&url)
            .timeout(LISTING_TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_transport_error(IMAGE_BACKEND_NAME, &e))?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(IMAGE_BACKEND_NAME, status, retry_after, &body));
        }

        let body: Value = response.json().await.map_err(|e| {
            GatewayError::terminal(
                IMAGE_BACKEND_NAME,
                format!("Failed to parse {endpoint} listing: {e}"),
                None,
            )
        })?;
        match body {
            Value::Array(entries) => Ok(entries),
            _ => Err(GatewayError::terminal(
                IMAGE_BACKEND_NAME,
                format!("Expected a list from {endpoint}"),
                None,
            )),
        }
    }

    /// Perform one txt2img call and return the first image, base64-encoded
    ///
    /// # Errors
    /// Returns a classified error on transport or status failures, and
    /// [`GatewayError::EmptyOutput`] when the backend returns no image
    pub async fn txt2img(&self, payload: &Txt2ImgPayload) -> GatewayResult<String> {
        let url = self.txt2img_url();
        debug!(url = %url, seed = payload.seed, "Sending txt2img request");

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| classify_transport_error(IMAGE_BACKEND_NAME, &e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(IMAGE_BACKEND_NAME, status, retry_after, &body));
        }

        let body: Txt2ImgResponse = response.json().await.map_err(|e| {
            GatewayError::terminal(
                IMAGE_BACKEND_NAME,
                format!("Failed to parse response: {e}"),
                None,
            )
        })?;

        body.images
            .into_iter()
            .find(|image| !image.is_empty())
            .ok_or_else(|| GatewayError::empty_output(None, "No images returned from SD server"))
    }
}

/// Decode a base64 image into an [`ImageResult`]
///
/// # Errors
/// Returns a terminal error when the image is not valid base64
pub fn decode_image(
    image_base64: String,
    payload: &Txt2ImgPayload,
    generation_time: Duration,
) -> GatewayResult<ImageResult> {
    let image = STANDARD.decode(image_base64.trim()).map_err(|e| {
        GatewayError::terminal(IMAGE_BACKEND_NAME, format!("Invalid image data: {e}"), None)
    })?;

    Ok(ImageResult {
        image_base64,
        image,
        prompt: payload.prompt.clone(),
        negative_prompt: payload.negative_prompt.clone(),
        seed: payload.seed,
        generation_time,
    })
}
