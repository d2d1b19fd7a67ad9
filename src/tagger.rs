// Tagging core: processed check, per-prompt pipeline and batch driver

use tracing::warn;

use crate::ai::prompts::Prompts;
use crate::ai::vision::VisionModel;
use crate::config::Config;
use crate::metadata::MetadataStore;

pub mod batch;
pub mod pipeline;
pub mod processed;
pub mod stage;

pub use batch::{collect_images, BatchReport};
pub use pipeline::{ImageReport, PromptOutcome, TagError};
pub use processed::{first_blank_field, is_complete};
pub use stage::Stage;

/// Drives a vision model and a metadata store over a tree of images.
pub struct Tagger<V, M> {
    vision: V,
    store: M,
    config: Config,
}

impl<V: VisionModel, M: MetadataStore> Tagger<V, M> {
    /// Prompts that are blank or shared between fields are replaced by the
    /// defaults, so every prompt writes its own field.
    pub fn new(vision: V, store: M, mut config: Config) -> Self {
        if !config.prompts.is_distinct() {
            warn!("configured prompts are not distinct, using the default prompts");
            config.prompts = Prompts::default();
        }
        Self {
            vision,
            store,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vision(&self) -> &V {
        &self.vision
    }

    pub fn store(&self) -> &M {
        &self.store
    }
}
