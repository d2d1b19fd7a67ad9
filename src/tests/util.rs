//! In-memory stand-ins for the vision model and the metadata store.

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ai::vision::{VisionError, VisionModel};
use crate::config::Config;
use crate::metadata::{sidecar_path, MetadataError, MetadataStore};

/// Vision model that records every prompt it receives.
///
/// Replies with `"<reply> [<prompt>]"`, or fails every call when built
/// with [`RecordingVision::failing`].
#[derive(Default)]
pub struct RecordingVision {
    reply: String,
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl RecordingVision {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl VisionModel for RecordingVision {
    async fn describe(&self, image_b64: &str, prompt: &str) -> Result<String, VisionError> {
        assert!(!image_b64.is_empty(), "vision model got an empty image");
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(VisionError::Api {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "model not loaded".into(),
            });
        }
        Ok(format!("{} [{}]", self.reply, prompt))
    }
}

/// Metadata store keeping sidecar fields in a map keyed by sidecar path.
#[derive(Default)]
pub struct MemoryStore {
    fields: Mutex<HashMap<PathBuf, HashMap<String, String>>>,
    writes: Mutex<Vec<(PathBuf, String, String)>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn set(&self, sidecar: &Path, tag: &str, value: &str) {
        self.fields
            .lock()
            .unwrap()
            .entry(sidecar.to_path_buf())
            .or_default()
            .insert(tag.to_string(), value.to_string());
    }

    pub fn fields(&self, sidecar: &Path) -> HashMap<String, String> {
        self.fields
            .lock()
            .unwrap()
            .get(sidecar)
            .cloned()
            .unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<(PathBuf, String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

fn tool_failure(what: &str) -> MetadataError {
    MetadataError::Tool {
        status: "exit status: 1".into(),
        stderr: format!("{what} failed"),
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn read_fields(
        &self,
        sidecar: &Path,
        tags: &[&str],
    ) -> Result<HashMap<String, String>, MetadataError> {
        if self.fail_reads {
            return Err(tool_failure("read"));
        }
        let stored = self.fields(sidecar);
        Ok(tags
            .iter()
            .filter_map(|tag| Some((tag.to_string(), stored.get(*tag)?.clone())))
            .collect())
    }

    async fn write_field(
        &self,
        sidecar: &Path,
        tag: &str,
        value: &str,
    ) -> Result<(), MetadataError> {
        if self.fail_writes {
            return Err(tool_failure("write"));
        }
        self.writes.lock().unwrap().push((
            sidecar.to_path_buf(),
            tag.to_string(),
            value.to_string(),
        ));
        self.set(sidecar, tag, value);
        Ok(())
    }
}

/// Config rooted at `root` with the progress bar hidden.
pub fn test_config(root: &Path) -> Config {
    Config {
        source_root: root.to_path_buf(),
        show_progress: false,
        ..Config::default()
    }
}

/// Save a small gradient image; the format follows the file extension.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
        .save(path)
        .unwrap();
}

/// Create an (empty) sidecar file next to `image` and return its path.
pub fn touch_sidecar(image: &Path) -> PathBuf {
    let sidecar = sidecar_path(image);
    std::fs::write(&sidecar, b"").unwrap();
    sidecar
}
