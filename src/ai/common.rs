use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

pub const GENERATE_PATH: &str = "/api/generate";

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Ollama API error (status {status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Serialize, Debug)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub images: [&'a str; 1],
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Serialize, Debug)]
pub struct GenerateOptions {
    pub temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub fn generate_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), GENERATE_PATH)
}

/// Post a non-streaming generate request and return the model's text.
#[instrument(level = "trace", skip(client, body))]
pub async fn request_generation(
    client: &reqwest::Client,
    url: &str,
    body: &GenerateRequest<'_>,
) -> Result<String, VisionError> {
    debug!(url, model = body.model, "sending generate request");

    let resp = client.post(url).json(body).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let err_text = resp.text().await.unwrap_or_default();
        warn!(%status, "Ollama API error");
        return Err(VisionError::Api {
            status,
            body: err_text,
        });
    }

    let raw = resp.text().await?;
    let snippet: String = raw.chars().take(200).collect();
    debug!(snippet = %snippet, "generate response body");
    trace!(raw = %raw, "generate response");
    let parsed: GenerateResponse = serde_json::from_str(&raw)?;
    Ok(parsed.response)
}
