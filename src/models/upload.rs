use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl UploadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::InProgress => "Uploading",
            UploadStatus::Succeeded => "Succeeded",
            UploadStatus::Failed => "Failed",
        }
    }

    /// Progress bar value shown in the history table
    pub fn progress(&self) -> f32 {
        match self {
            UploadStatus::Succeeded => 1.0,
            UploadStatus::InProgress | UploadStatus::Failed => 0.0,
        }
    }
}

/// One row of the upload history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub image_name: String,
    pub dataset_name: String,
    pub image_path: PathBuf,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Local>,
    pub status: UploadStatus,
}

impl UploadRecord {
    pub fn size_label(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Human readable byte count, e.g. `1.5 MB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_status_progress() {
        assert_eq!(UploadStatus::Succeeded.progress(), 1.0);
        assert_eq!(UploadStatus::Failed.progress(), 0.0);
        assert_eq!(UploadStatus::InProgress.progress(), 0.0);
    }
}
