use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts::IMAGE_NEGATIVE_PROMPT;
use super::{http_client, CollaboratorError, RateLimiter, RetryPolicy};

/// txt2img payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f32,
    pub sampler_name: String,
    pub batch_size: u32,
}

impl ImageRequest {
    /// The fixed generation settings with `prompt` substituted.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: IMAGE_NEGATIVE_PROMPT.to_string(),
            steps: 20,
            width: 768,
            height: 512,
            cfg_scale: 7.0,
            sampler_name: "Euler a".to_string(),
            batch_size: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// Prompt in, decoded raster out.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<RgbaImage, CollaboratorError>;
}

#[derive(Clone)]
pub struct HttpImageClient {
    client: Client,
    url: String,
    policy: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl HttpImageClient {
    pub fn new(
        url: impl Into<String>,
        policy: RetryPolicy,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: http_client(&policy)?,
            url: url.into(),
            policy,
            limiter,
        })
    }

    async fn call_once(&self, request: &ImageRequest) -> Result<RgbaImage, CollaboratorError> {
        self.limiter
            .try_acquire()
            .map_err(|retry_after| CollaboratorError::RateLimited { retry_after })?;

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: ImageResponse = serde_json::from_slice(&bytes)?;
        let first = parsed
            .images
            .into_iter()
            .next()
            .ok_or(CollaboratorError::EmptyResponse)?;

        let image = decode_image_payload(&first)?;
        debug!(
            "Image service returned {}x{} image",
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

#[async_trait]
impl ImageGenerator for HttpImageClient {
    async fn generate(&self, request: &ImageRequest) -> Result<RgbaImage, CollaboratorError> {
        self.policy
            .run("Image service", || self.call_once(request))
            .await
    }
}

/// Decodes a base64 image, with or without a `data:...;base64,` prefix.
pub fn decode_image_payload(payload: &str) -> Result<RgbaImage, CollaboratorError> {
    let encoded = match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    };
    let bytes = STANDARD.decode(encoded.trim())?;
    if bytes.is_empty() {
        return Err(CollaboratorError::EmptyResponse);
    }
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}
