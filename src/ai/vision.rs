use async_trait::async_trait;
use tracing::instrument;

use crate::ai::common::{generate_url, request_generation, GenerateOptions, GenerateRequest};
use crate::ai::config::VisionConfig;

pub use crate::ai::common::VisionError;

/// Something that can answer a text prompt about an image.
///
/// `image_b64` is a base64 encoded JPEG. Implementations block until the
/// complete response is available.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn describe(&self, image_b64: &str, prompt: &str) -> Result<String, VisionError>;
}

/// Client for a locally hosted Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: generate_url(&config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl VisionModel for OllamaClient {
    #[instrument(level = "trace", skip(self, image_b64))]
    async fn describe(&self, image_b64: &str, prompt: &str) -> Result<String, VisionError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            images: [image_b64],
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };
        request_generation(&self.http, &self.url, &body).await
    }
}
