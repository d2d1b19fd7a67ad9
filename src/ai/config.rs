use std::env;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_VISION_MODEL: &str = "llava-phi3";

#[derive(Clone, Debug, PartialEq)]
pub struct VisionConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

impl VisionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("OLLAMA_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            temperature: env::var("OLLAMA_TEMPERATURE")
                .ok()
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(defaults.temperature),
        }
    }
}
