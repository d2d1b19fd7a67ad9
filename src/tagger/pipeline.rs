use image::ImageError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::processed::sidecar_exists;
use super::{Stage, Tagger};
use crate::ai::vision::{VisionError, VisionModel};
use crate::image_utils::{encode_jpeg_base64, load_image, resize_to_width, MODEL_INPUT_WIDTH};
use crate::metadata::{sidecar_path, Field, MetadataError, MetadataStore};

#[derive(Error, Debug)]
pub enum TagError {
    #[error("failed to load image {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("image {} is too large to resize: {source}", .path.display())]
    ImageTooLarge {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("failed to encode image {}: {source}", .path.display())]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("vision model request failed: {0}")]
    Vision(#[from] VisionError),
    #[error("failed to write {tag} to {}: {source}", .sidecar.display())]
    MetadataWrite {
        sidecar: PathBuf,
        tag: String,
        #[source]
        source: MetadataError,
    },
}

/// What a single prompt did to the sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Written(Field),
    /// No sidecar next to the image; nothing was written.
    SidecarMissing,
    /// The prompt is not one of the configured ones; nothing was written.
    UnmappedPrompt,
}

/// Results of running every prompt for one image.
#[derive(Debug, Default)]
pub struct ImageReport {
    pub stage: Stage,
    pub written: Vec<Field>,
    pub sidecar_missing: bool,
    pub errors: Vec<TagError>,
}

impl ImageReport {
    fn failed(err: TagError) -> Self {
        Self {
            errors: vec![err],
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: PromptOutcome) {
        match outcome {
            PromptOutcome::Written(field) => self.written.push(field),
            PromptOutcome::SidecarMissing => self.sidecar_missing = true,
            PromptOutcome::UnmappedPrompt => {}
        }
    }
}

impl<V: VisionModel, M: MetadataStore> Tagger<V, M> {
    /// Load, resize to the model input width and encode as base64 JPEG.
    pub async fn prepare_image(&self, image: &Path) -> Result<String, TagError> {
        let img = load_image(image)
            .await
            .map_err(|source| TagError::ImageLoad {
                path: image.to_path_buf(),
                source,
            })?;
        let resized =
            resize_to_width(&img, MODEL_INPUT_WIDTH).map_err(|source| TagError::ImageTooLarge {
                path: image.to_path_buf(),
                source,
            })?;
        debug!(
            path = %image.display(),
            from = ?(img.width(), img.height()),
            to = ?(resized.width(), resized.height()),
            "resized image"
        );
        encode_jpeg_base64(&resized).map_err(|source| TagError::ImageEncode {
            path: image.to_path_buf(),
            source,
        })
    }

    /// Ask the model `prompt` about `image` and store the answer in the
    /// sidecar field the prompt belongs to.
    #[instrument(level = "debug", skip(self))]
    pub async fn tag_with_prompt(
        &self,
        image: &Path,
        prompt: &str,
    ) -> Result<PromptOutcome, TagError> {
        info!(path = %image.display(), "Processing image");
        let encoded = self.prepare_image(image).await?;
        self.tag_encoded(image, &encoded, prompt).await
    }

    /// Same as [`Tagger::tag_with_prompt`] for an image that is already
    /// prepared.
    pub async fn tag_encoded(
        &self,
        image: &Path,
        encoded: &str,
        prompt: &str,
    ) -> Result<PromptOutcome, TagError> {
        let response = self.vision.describe(encoded, prompt).await?;
        info!(path = %image.display(), response = %response, "model response");

        let Some(field) = self.config.prompts.field_for(prompt) else {
            debug!(prompt, "prompt has no sidecar field, nothing written");
            return Ok(PromptOutcome::UnmappedPrompt);
        };

        let sidecar = sidecar_path(image);
        if !sidecar_exists(&sidecar).await {
            info!(path = %image.display(), "XMP sidecar file not found, skipping");
            return Ok(PromptOutcome::SidecarMissing);
        }

        self.write(&sidecar, field.tag(), &response).await?;

        if let Some(marker) = &self.config.marker {
            if let Err(err) = self.write(&sidecar, &marker.tag, &marker.current_value()).await {
                warn!(error = %err, "failed to stamp processed marker");
            }
        }

        Ok(PromptOutcome::Written(field))
    }

    /// Run the title, description and keyword prompts for one image.
    ///
    /// The image is decoded once. Each prompt is independent, so a failed
    /// prompt is recorded and the next one still runs.
    #[instrument(level = "debug", skip(self))]
    pub async fn tag_image(&self, image: &Path) -> ImageReport {
        info!(path = %image.display(), "Processing image");
        let encoded = match self.prepare_image(image).await {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(path = %image.display(), error = %err, "Error processing image");
                return ImageReport::failed(err);
            }
        };

        let mut report = ImageReport::default();
        while let Some(field) = report.stage.pending_field() {
            let prompt = self.config.prompts.prompt_for(field);
            match self.tag_encoded(image, &encoded, prompt).await {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    error!(path = %image.display(), %field, error = %err, "Error processing image");
                    report.errors.push(err);
                }
            }
            report.stage = report.stage.advance();
        }
        report
    }

    async fn write(&self, sidecar: &Path, tag: &str, value: &str) -> Result<(), TagError> {
        self.store
            .write_field(sidecar, tag, value)
            .await
            .map_err(|source| TagError::MetadataWrite {
                sidecar: sidecar.to_path_buf(),
                tag: tag.to_string(),
                source,
            })
    }
}
