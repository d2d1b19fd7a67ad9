use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub mod ai;
pub mod config;
pub mod image_utils;
pub mod metadata;
mod system_info;
pub mod tagger;
pub mod tests {
    pub mod util;
}

pub use ai::vision::{OllamaClient, VisionModel};
pub use config::Config;
pub use metadata::{ExiftoolStore, Field, MetadataStore};
pub use system_info::{get_system_info, script_version};
pub use tagger::{BatchReport, PromptOutcome, TagError, Tagger};

// ──────────────────────────────────────────────────────────────
// Main application setup
// ──────────────────────────────────────────────────────────────

pub async fn run() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Also loads .env if it exists
    let config = Config::from_env();

    let vision = OllamaClient::new(&config.vision);
    let store = ExiftoolStore::new(
        config.exiftool.program.clone(),
        config.exiftool.overwrite_original,
    );
    let tagger = Tagger::new(vision, store, config);

    tracing::info!("{}", get_system_info().replace('\n', ", "));
    let config = tagger.config();
    tracing::info!(
        root = %config.source_root.display(),
        model = tagger.vision().model(),
        url = %config.vision.base_url,
        force = config.force_reprocess,
        "Starting photo tagger..."
    );

    tagger.run().await?;

    tracing::info!("Processing complete.");
    Ok(())
}
