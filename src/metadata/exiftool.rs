use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use super::{MetadataError, MetadataStore};

/// [`MetadataStore`] backed by the `exiftool` command line tool.
///
/// Every call spawns one exiftool process and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ExiftoolStore {
    program: PathBuf,
    overwrite_original: bool,
}

impl Default for ExiftoolStore {
    fn default() -> Self {
        Self::new("exiftool", false)
    }
}

impl ExiftoolStore {
    /// `overwrite_original` stops exiftool from leaving `*_original` backups.
    pub fn new(program: impl Into<PathBuf>, overwrite_original: bool) -> Self {
        Self {
            program: program.into(),
            overwrite_original,
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Output, MetadataError> {
        trace!(program = %self.program.display(), ?args, "running exiftool");
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(MetadataError::Tool {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

pub fn read_args(sidecar: &Path, tags: &[&str]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-j".into(), "-G".into(), "-n".into()];
    args.extend(tags.iter().map(|tag| OsString::from(format!("-{tag}"))));
    args.push(sidecar.into());
    args
}

pub fn write_args(
    sidecar: &Path,
    tag: &str,
    value: &str,
    overwrite_original: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(3);
    if overwrite_original {
        args.push("-overwrite_original".into());
    }
    args.push(format!("-{tag}={value}").into());
    args.push(sidecar.into());
    args
}

/// Pull the requested tags out of `exiftool -j -G` output.
///
/// List values (XMP bags such as `Subject`) are joined with `", "`; other
/// scalars are rendered as text.
pub fn parse_json_output(
    raw: &str,
    tags: &[&str],
) -> Result<HashMap<String, String>, MetadataError> {
    let entries: Vec<Map<String, Value>> = serde_json::from_str(raw)?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(HashMap::new());
    };

    Ok(tags
        .iter()
        .filter_map(|tag| {
            let value = value_to_text(entry.get(*tag)?)?;
            Some((tag.to_string(), value))
        })
        .collect())
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl MetadataStore for ExiftoolStore {
    #[instrument(level = "debug", skip(self))]
    async fn read_fields(
        &self,
        sidecar: &Path,
        tags: &[&str],
    ) -> Result<HashMap<String, String>, MetadataError> {
        let output = self.run(read_args(sidecar, tags)).await?;
        let raw = String::from_utf8_lossy(&output.stdout);
        trace!(raw = %raw, "exiftool read output");
        parse_json_output(&raw, tags)
    }

    #[instrument(level = "debug", skip(self, value))]
    async fn write_field(
        &self,
        sidecar: &Path,
        tag: &str,
        value: &str,
    ) -> Result<(), MetadataError> {
        let output = self
            .run(write_args(sidecar, tag, value, self.overwrite_original))
            .await?;
        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "exiftool write finished"
        );
        Ok(())
    }
}
