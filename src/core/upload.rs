//! Upload planning and the background upload worker
//!
//! Files dropped or picked on the upload page are filtered to images, given a
//! target name (renamed when the dataset settings ask for it) and staged into
//! the cache directory by a worker thread that reports progress over a
//! channel.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DatasetSection;
use crate::core::operations::stage_file;
use crate::models::{UploadRecord, UploadStatus};

/// Prefix used for renamed files when the configured key is blank
pub const DEFAULT_RENAME_KEY: &str = "img";

/// A file accepted for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub source: PathBuf,
    pub target_name: String,
    pub size_bytes: u64,
}

/// Outcome of checking a batch of dropped or picked files
#[derive(Debug, Default)]
pub struct UploadPlan {
    pub accepted: Vec<PlannedUpload>,
    /// Files that were refused, with the reason
    pub rejected: Vec<(PathBuf, String)>,
}

/// Whether `path` has an extension of a readable image format
pub fn is_supported_image(path: &Path) -> bool {
    image::ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}

/// Target name for the `index`-th (1-based) file of a renamed batch
pub fn renamed_target(key: &str, now: DateTime<Local>, index: usize, extension: &str) -> String {
    let key = key.trim();
    let key = if key.is_empty() { DEFAULT_RENAME_KEY } else { key };
    format!(
        "{}_{}_{:03}.{}",
        key,
        now.format("%Y%m%d%H%M%S"),
        index,
        extension.to_lowercase()
    )
}

/// Check `files` and decide the name each accepted file is staged under
///
/// Renamed targets take the next index that is free in the cache directory,
/// so a second batch within the same second doesn't collide with the first.
pub fn plan_uploads(files: &[PathBuf], prefs: &DatasetSection, now: DateTime<Local>) -> UploadPlan {
    let mut plan = UploadPlan::default();
    let staging_dir = Path::new(&prefs.tmp_dir);
    let mut next_index = 1;

    for path in files {
        if !is_supported_image(path) {
            plan.rejected
                .push((path.clone(), "not a supported image".to_string()));
            continue;
        }

        let metadata = match fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => {
                plan.rejected.push((path.clone(), "not a file".to_string()));
                continue;
            }
            Err(e) => {
                plan.rejected.push((path.clone(), e.to_string()));
                continue;
            }
        };

        let original_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let target_name = if prefs.auto_rename {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            loop {
                let name = renamed_target(&prefs.auto_rename_key, now, next_index, extension);
                next_index += 1;
                if !staging_dir.join(&name).exists() {
                    break name;
                }
            }
        } else {
            original_name
        };

        plan.accepted.push(PlannedUpload {
            source: path.clone(),
            target_name,
            size_bytes: metadata.len(),
        });
    }

    debug!(
        "Planned {} uploads, rejected {}",
        plan.accepted.len(),
        plan.rejected.len()
    );
    plan
}

/// Messages from the upload worker to the UI thread
#[derive(Debug)]
pub enum UploadProgressMessage {
    Progress { index: usize, fraction: f32 },
    Finished { index: usize, record: UploadRecord },
    Complete(UploadStats),
    Cancelled(UploadStats),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub succeeded: usize,
    pub failed: usize,
}

/// Everything the worker thread needs
pub struct UploadJob {
    pub dataset_name: String,
    pub staging_dir: PathBuf,
    pub items: Vec<PlannedUpload>,
    /// Number of simulated progress steps per file
    pub steps: u32,
    pub step_delay: Duration,
}

/// Handle kept by the UI while a job runs
pub struct UploadHandle {
    pub receiver: Receiver<UploadProgressMessage>,
    cancel_flag: Arc<AtomicBool>,
}

impl UploadHandle {
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }
}

/// Run `job` on a background thread
pub fn spawn_upload(job: UploadJob) -> UploadHandle {
    let (tx, rx) = channel();
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let flag = cancel_flag.clone();

    thread::spawn(move || run_upload(job, &tx, &flag));

    UploadHandle {
        receiver: rx,
        cancel_flag,
    }
}

fn run_upload(job: UploadJob, tx: &Sender<UploadProgressMessage>, cancel: &AtomicBool) {
    info!(
        "Upload started: {} files into dataset {}",
        job.items.len(),
        job.dataset_name
    );
    let mut stats = UploadStats::default();

    for (index, item) in job.items.iter().enumerate() {
        for step in 1..=job.steps {
            if cancel.load(Ordering::Relaxed) {
                warn!("Upload cancelled at file {}/{}", index + 1, job.items.len());
                let _ = tx.send(UploadProgressMessage::Cancelled(stats));
                return;
            }
            thread::sleep(job.step_delay);
            let _ = tx.send(UploadProgressMessage::Progress {
                index,
                fraction: step as f32 / job.steps as f32,
            });
        }

        let (status, image_path) = match stage_file(&item.source, &job.staging_dir, &item.target_name)
        {
            Ok(staged) => {
                stats.succeeded += 1;
                (UploadStatus::Succeeded, staged)
            }
            Err(e) => {
                warn!("Upload of {:?} failed: {}", item.source, e);
                stats.failed += 1;
                (UploadStatus::Failed, item.source.clone())
            }
        };

        let record = UploadRecord {
            image_name: item.target_name.clone(),
            dataset_name: job.dataset_name.clone(),
            image_path,
            size_bytes: item.size_bytes,
            uploaded_at: Local::now(),
            status,
        };
        let _ = tx.send(UploadProgressMessage::Finished { index, record });
    }

    info!(
        "Upload complete. Succeeded: {}, Failed: {}",
        stats.succeeded, stats.failed
    );
    let _ = tx.send(UploadProgressMessage::Complete(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 4, 7, 9, 30, 5).unwrap()
    }

    fn prefs(auto_rename: bool, key: &str) -> DatasetSection {
        DatasetSection {
            tmp_dir: String::new(),
            save_dir: String::new(),
            auto_rename,
            auto_rename_key: key.to_string(),
        }
    }

    fn collect(handle: &UploadHandle) -> Vec<UploadProgressMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = handle.receiver.recv_timeout(Duration::from_secs(5)) {
            let done = matches!(
                message,
                UploadProgressMessage::Complete(_) | UploadProgressMessage::Cancelled(_)
            );
            messages.push(message);
            if done {
                break;
            }
        }
        messages
    }

    #[test]
    fn test_supported_image_extensions() {
        assert!(is_supported_image(Path::new("a/b/cat.PNG")));
        assert!(is_supported_image(Path::new("cat.jpeg")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_renamed_target() {
        assert_eq!(
            renamed_target("cap", fixed_time(), 7, "JPG"),
            "cap_20240407093005_007.jpg"
        );
        assert_eq!(
            renamed_target("  ", fixed_time(), 1, "png"),
            "img_20240407093005_001.png"
        );
    }

    #[test]
    fn test_plan_uploads_filters_and_renames() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.jpg");
        fs::write(&a, b"aaaa").unwrap();
        fs::write(&b, b"bb").unwrap();
        fs::write(&c, b"cc").unwrap();
        let missing = dir.path().join("d.png");

        let plan = plan_uploads(
            &[a.clone(), b.clone(), c.clone(), missing.clone()],
            &prefs(true, "set"),
            fixed_time(),
        );

        let names: Vec<&str> = plan.accepted.iter().map(|p| p.target_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["set_20240407093005_001.png", "set_20240407093005_002.jpg"]
        );
        assert_eq!(plan.accepted[0].size_bytes, 4);
        let rejected: Vec<&PathBuf> = plan.rejected.iter().map(|(p, _)| p).collect();
        assert_eq!(rejected, vec![&b, &missing]);
    }

    #[test]
    fn test_plan_uploads_skips_names_already_staged() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache");
        fs::create_dir(&cache).unwrap();
        fs::write(cache.join("set_20240407093005_001.png"), b"old").unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let mut settings = prefs(true, "set");
        settings.tmp_dir = cache.to_string_lossy().into_owned();
        let plan = plan_uploads(&[a, b], &settings, fixed_time());

        let names: Vec<&str> = plan.accepted.iter().map(|p| p.target_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["set_20240407093005_002.png", "set_20240407093005_003.png"]
        );
    }

    #[test]
    fn test_plan_uploads_keeps_names_without_rename() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("Original Name.png");
        fs::write(&a, b"x").unwrap();

        let plan = plan_uploads(&[a], &prefs(false, "set"), fixed_time());
        assert_eq!(plan.accepted[0].target_name, "Original Name.png");
    }

    #[test]
    fn test_worker_stages_files_and_reports() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.png");
        fs::write(&src, b"img").unwrap();
        let staging = dir.path().join("cache");

        let handle = spawn_upload(UploadJob {
            dataset_name: "Dataset 1".to_string(),
            staging_dir: staging.clone(),
            items: vec![
                PlannedUpload {
                    source: src,
                    target_name: "renamed.png".to_string(),
                    size_bytes: 3,
                },
                PlannedUpload {
                    source: dir.path().join("missing.png"),
                    target_name: "missing.png".to_string(),
                    size_bytes: 0,
                },
            ],
            steps: 2,
            step_delay: Duration::ZERO,
        });

        let messages = collect(&handle);
        let progress = messages
            .iter()
            .filter(|m| matches!(m, UploadProgressMessage::Progress { .. }))
            .count();
        assert_eq!(progress, 4);

        let records: Vec<&UploadRecord> = messages
            .iter()
            .filter_map(|m| match m {
                UploadProgressMessage::Finished { record, .. } => Some(record),
                _ => None,
            })
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, UploadStatus::Succeeded);
        assert_eq!(records[0].image_path, staging.join("renamed.png"));
        assert_eq!(records[0].dataset_name, "Dataset 1");
        assert_eq!(records[1].status, UploadStatus::Failed);

        assert!(matches!(
            messages.last(),
            Some(UploadProgressMessage::Complete(UploadStats {
                succeeded: 1,
                failed: 1
            }))
        ));
        assert!(staging.join("renamed.png").exists());
    }

    #[test]
    fn test_worker_cancel() {
        let dir = TempDir::new().unwrap();
        let items = (0..50)
            .map(|i| PlannedUpload {
                source: dir.path().join(format!("{}.png", i)),
                target_name: format!("{}.png", i),
                size_bytes: 0,
            })
            .collect();

        let handle = spawn_upload(UploadJob {
            dataset_name: "d".to_string(),
            staging_dir: dir.path().join("cache"),
            items,
            steps: 10,
            step_delay: Duration::from_millis(5),
        });
        handle.cancel();

        let messages = collect(&handle);
        assert!(matches!(
            messages.last(),
            Some(UploadProgressMessage::Cancelled(_))
        ));
    }
}
