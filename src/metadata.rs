// Sidecar metadata access

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod exiftool;

pub use exiftool::ExiftoolStore;

/// Sidecar fields this tool fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    /// Keywords, stored as one flat string.
    Subject,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Description, Field::Subject];

    /// Group-qualified tag name as understood by exiftool.
    pub fn tag(self) -> &'static str {
        match self {
            Field::Title => "XMP:Title",
            Field::Description => "XMP:Description",
            Field::Subject => "XMP:Subject",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to run metadata tool: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("metadata tool failed ({status}): {stderr}")]
    Tool { status: String, stderr: String },
    #[error("unreadable metadata tool output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Named string fields stored in a sidecar file.
///
/// Missing fields are simply absent from the map returned by
/// [`MetadataStore::read_fields`].
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn read_fields(
        &self,
        sidecar: &Path,
        tags: &[&str],
    ) -> Result<HashMap<String, String>, MetadataError>;

    async fn write_field(&self, sidecar: &Path, tag: &str, value: &str)
        -> Result<(), MetadataError>;
}

/// Sidecar location for an image: same path, extension replaced by `xmp`.
pub fn sidecar_path(image: &Path) -> PathBuf {
    image.with_extension("xmp")
}

/// Extra tag stamped after every field write, recording the tool version
/// and the day it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMarker {
    pub tag: String,
    pub version: String,
}

impl ProcessedMarker {
    pub fn value_for(&self, date: NaiveDate) -> String {
        format!("{}_{}", date.format("%Y-%m-%d"), self.version)
    }

    pub fn current_value(&self) -> String {
        self.value_for(chrono::Local::now().date_naive())
    }
}
