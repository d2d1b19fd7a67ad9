use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::ai::config::VisionConfig;
use crate::ai::prompts::Prompts;
use crate::metadata::ProcessedMarker;
use crate::system_info::script_version;

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];

#[derive(Clone, Debug, PartialEq)]
pub struct ExiftoolConfig {
    pub program: PathBuf,
    pub overwrite_original: bool,
}

impl Default for ExiftoolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("exiftool"),
            overwrite_original: false,
        }
    }
}

/// Everything the batch run needs to know.
///
/// `Config::default()` scans the current directory for `jpeg`, `jpg` and
/// `png` files, skips images whose sidecar is already complete, and talks
/// to Ollama on `127.0.0.1:11434` using the `llava-phi3` model.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub source_root: PathBuf,
    pub force_reprocess: bool,
    /// File extensions without the dot; matched case-sensitively.
    pub extensions: Vec<String>,
    pub show_progress: bool,
    pub vision: VisionConfig,
    pub prompts: Prompts,
    pub exiftool: ExiftoolConfig,
    pub marker: Option<ProcessedMarker>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            force_reprocess: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            show_progress: true,
            vision: VisionConfig::default(),
            prompts: Prompts::default(),
            exiftool: ExiftoolConfig::default(),
            marker: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let prompts = Prompts {
            title: env_prompt("TAGGER_PROMPT_TITLE").unwrap_or(defaults.prompts.title),
            description: env_prompt("TAGGER_PROMPT_DESCRIPTION")
                .unwrap_or(defaults.prompts.description),
            keywords: env_prompt("TAGGER_PROMPT_KEYWORDS").unwrap_or(defaults.prompts.keywords),
        };
        let prompts = if prompts.is_distinct() {
            prompts
        } else {
            warn!("configured prompts are not distinct, using the default prompts");
            Prompts::default()
        };

        let extensions = env::var("TAGGER_EXTENSIONS")
            .ok()
            .map(|list| parse_extensions(&list))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.extensions);

        let marker = env::var("TAGGER_MARKER_TAG")
            .ok()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .map(|tag| ProcessedMarker {
                tag,
                version: script_version(),
            });

        Self {
            source_root: env::var("TAGGER_SOURCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_root),
            force_reprocess: env_flag("TAGGER_FORCE_REPROCESS")
                .unwrap_or(defaults.force_reprocess),
            extensions,
            show_progress: env_flag("TAGGER_PROGRESS").unwrap_or(defaults.show_progress),
            vision: VisionConfig::from_env(),
            prompts,
            exiftool: ExiftoolConfig {
                program: env::var("EXIFTOOL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.exiftool.program),
                overwrite_original: env_flag("EXIFTOOL_OVERWRITE_ORIGINAL")
                    .unwrap_or(defaults.exiftool.overwrite_original),
            },
            marker,
        }
    }
}

/// Split a comma separated extension list, dropping dots and blanks.
pub fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches("*.").trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret a boolean environment variable; unrecognised values are ignored.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Prompt override from the environment; blank values count as unset.
fn env_prompt(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(prompt) if prompt.trim().is_empty() => {
            warn!(var = name, "ignoring blank prompt");
            None
        }
        Ok(prompt) => Some(prompt),
        Err(_) => None,
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}
