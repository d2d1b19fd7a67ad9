use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{ImageReport, Tagger};
use crate::ai::vision::VisionModel;
use crate::metadata::MetadataStore;

/// Totals for one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub files_found: usize,
    pub skipped: usize,
    pub attempted: usize,
    pub fields_written: usize,
    pub missing_sidecars: usize,
    pub failures: usize,
}

impl BatchReport {
    fn absorb(&mut self, image: &ImageReport) {
        self.attempted += 1;
        self.fields_written += image.written.len();
        self.failures += image.errors.len();
        if image.sidecar_missing {
            self.missing_sidecars += 1;
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed == ext))
        .unwrap_or(false)
}

/// Every file below `root` whose extension is exactly one of `extensions`,
/// in file-name order. Unreadable entries are logged and skipped.
pub fn collect_images(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    files
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let template = "Processing images {wide_bar} {pos}/{len} [{elapsed_precise}]";
    match ProgressStyle::with_template(template) {
        Ok(style) => pb.set_style(style),
        Err(err) => warn!(error = %err, "invalid progress bar template"),
    }
    pb
}

impl<V: VisionModel, M: MetadataStore> Tagger<V, M> {
    /// Tag every image under the configured source root.
    ///
    /// Only an inaccessible source root is an error; problems with single
    /// images are logged and counted in the report.
    pub async fn run(&self) -> Result<BatchReport> {
        let root = &self.config.source_root;
        let meta = tokio::fs::metadata(root)
            .await
            .with_context(|| format!("source directory {} is not accessible", root.display()))?;
        if !meta.is_dir() {
            bail!("source path {} is not a directory", root.display());
        }

        info!(root = %root.display(), "Collecting file list...");
        let files = collect_images(root, &self.config.extensions);
        let mut report = BatchReport {
            files_found: files.len(),
            ..BatchReport::default()
        };
        info!(count = files.len(), "found images");

        let pb = progress_bar(files.len() as u64, self.config.show_progress);
        for path in &files {
            if !self.config.force_reprocess && self.is_processed(path).await {
                report.skipped += 1;
                pb.inc(1);
                continue;
            }
            let image_report = self.tag_image(path).await;
            report.absorb(&image_report);
            pb.inc(1);
        }
        pb.finish();

        info!(
            found = report.files_found,
            skipped = report.skipped,
            attempted = report.attempted,
            written = report.fields_written,
            missing_sidecars = report.missing_sidecars,
            failures = report.failures,
            "Finished tagging images"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{sidecar_path, Field};
    use crate::tests::util::{
        test_config, touch_sidecar, write_test_image, MemoryStore, RecordingVision,
    };

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn collects_matching_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("2024/summer")).unwrap();
        for name in [
            "b.jpg",
            "a.png",
            "notes.txt",
            "a.xmp",
            "2024/summer/c.jpeg",
            "2024/d.JPG",
        ] {
            std::fs::write(root.join(name), b"").unwrap();
        }

        let files = collect_images(root, &exts(&["jpeg", "jpg", "png"]));
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("2024/summer/c.jpeg"),
                PathBuf::from("a.png"),
                PathBuf::from("b.jpg"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_sidecar_gets_all_three_fields() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("photo1.jpg");
        write_test_image(&image, 300, 200);
        let sidecar = touch_sidecar(&image);
        let store = MemoryStore::default();
        for field in Field::ALL {
            store.set(&sidecar, field.tag(), "");
        }
        let tagger = Tagger::new(RecordingVision::replying("ok"), store, test_config(dir.path()));

        let report = tagger.run().await.unwrap();
        assert_eq!(tagger.vision().call_count(), 3);
        assert_eq!(report.fields_written, 3);
        let fields = tagger.store().fields(&sidecar);
        for field in Field::ALL {
            assert!(!fields[field.tag()].trim().is_empty());
        }
        // a second run finds nothing left to do
        let again = tagger.run().await.unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(tagger.vision().call_count(), 3);
    }

    #[tokio::test]
    async fn force_reprocess_ignores_complete_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("photo1.jpg");
        write_test_image(&image, 50, 50);
        let sidecar = touch_sidecar(&image);
        let store = MemoryStore::default();
        for field in Field::ALL {
            store.set(&sidecar, field.tag(), "already there");
        }
        let mut config = test_config(dir.path());
        config.force_reprocess = true;
        let tagger = Tagger::new(RecordingVision::replying("new"), store, config);

        let report = tagger.run().await.unwrap();
        assert_eq!(report.skipped, 0);
        assert_eq!(tagger.vision().call_count(), 3);
        assert!(tagger.store().fields(&sidecar)["XMP:Title"].starts_with("new"));
    }

    #[tokio::test]
    async fn bad_files_do_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("a_broken.jpg");
        std::fs::write(&broken, b"garbage").unwrap();
        touch_sidecar(&broken);
        let good = dir.path().join("b_good.png");
        write_test_image(&good, 20, 10);
        touch_sidecar(&good);
        let tagger = Tagger::new(
            RecordingVision::replying("ok"),
            MemoryStore::default(),
            test_config(dir.path()),
        );

        let report = tagger.run().await.unwrap();
        assert_eq!(report.files_found, 2);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.fields_written, 3);
        assert_eq!(tagger.store().fields(&sidecar_path(&good)).len(), 3);
    }

    #[tokio::test]
    async fn duplicate_prompts_still_fill_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("photo1.jpg");
        write_test_image(&image, 60, 40);
        let sidecar = touch_sidecar(&image);
        let mut config = test_config(dir.path());
        config.prompts.title = config.prompts.keywords.clone();
        let tagger = Tagger::new(RecordingVision::replying("ok"), MemoryStore::default(), config);
        assert!(tagger.config().prompts.is_distinct());

        tagger.run().await.unwrap();
        let fields = tagger.store().fields(&sidecar);
        assert!(fields.contains_key(Field::Title.tag()));
        let again = tagger.run().await.unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(tagger.vision().call_count(), 3);
    }

    #[tokio::test]
    async fn oversized_resize_fails_only_that_image() {
        let dir = tempfile::tempdir().unwrap();
        let strip = dir.path().join("a_strip.png");
        write_test_image(&strip, 1, 20_000);
        touch_sidecar(&strip);
        let good = dir.path().join("b_ok.png");
        write_test_image(&good, 30, 20);
        touch_sidecar(&good);
        let tagger = Tagger::new(
            RecordingVision::replying("ok"),
            MemoryStore::default(),
            test_config(dir.path()),
        );

        let report = tagger.run().await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.fields_written, 3);
        assert!(tagger.store().fields(&sidecar_path(&strip)).is_empty());
        assert_eq!(tagger.store().fields(&sidecar_path(&good)).len(), 3);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tagger = Tagger::new(
            RecordingVision::replying("ok"),
            MemoryStore::default(),
            test_config(&dir.path().join("nope")),
        );
        assert!(tagger.run().await.is_err());
    }
}
