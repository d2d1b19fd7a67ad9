use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument, warn};

use super::Tagger;
use crate::ai::vision::VisionModel;
use crate::metadata::{sidecar_path, Field, MetadataStore};

/// First of the three tagged fields that is missing or blank.
pub fn first_blank_field(fields: &HashMap<String, String>) -> Option<Field> {
    Field::ALL
        .into_iter()
        .find(|field| fields.get(field.tag()).map_or(true, |v| v.trim().is_empty()))
}

/// A sidecar is complete when title, description and subject all hold text.
pub fn is_complete(fields: &HashMap<String, String>) -> bool {
    first_blank_field(fields).is_none()
}

pub(crate) async fn sidecar_exists(sidecar: &Path) -> bool {
    tokio::fs::try_exists(sidecar).await.unwrap_or(false)
}

impl<V: VisionModel, M: MetadataStore> Tagger<V, M> {
    /// Whether `image` is already fully tagged.
    ///
    /// An image without a sidecar, or whose sidecar cannot be read, counts
    /// as not processed.
    #[instrument(level = "debug", skip(self))]
    pub async fn is_processed(&self, image: &Path) -> bool {
        let sidecar = sidecar_path(image);
        if !sidecar_exists(&sidecar).await {
            info!(sidecar = %sidecar.display(), "XMP sidecar file not found");
            return false;
        }

        let tags = Field::ALL.map(Field::tag);
        let fields = match self.store.read_fields(&sidecar, &tags).await {
            Ok(fields) => fields,
            Err(err) => {
                warn!(sidecar = %sidecar.display(), error = %err, "failed to read sidecar");
                return false;
            }
        };

        match first_blank_field(&fields) {
            Some(field) => {
                info!(path = %image.display(), %field, "field is empty");
                false
            }
            None => {
                info!(path = %image.display(), "already processed");
                true
            }
        }
    }
}
