use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::core::upload::UploadHandle;
use crate::models::UploadRecord;

/// Page shown in the central panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Datasets,
    Upload,
    Settings,
}

/// Datasets page input state
#[derive(Default)]
pub struct DatasetPageState {
    /// Whether the search box is shown
    pub show_search: bool,
    /// Search box content
    pub search_input: String,
    /// Whether the "new dataset" dialog is shown
    pub show_create_dialog: bool,
    /// Name typed into the "new dataset" dialog
    pub new_dataset_name: String,
    /// Validation message shown inside the dialog
    pub create_error: Option<String>,
}

/// Upload job currently running on the worker thread
pub struct ActiveUpload {
    pub handle: UploadHandle,
    pub names: Vec<String>,
    /// Progress of each file, 0.0 to 1.0
    pub progress: Vec<f32>,
}

impl ActiveUpload {
    pub fn overall_progress(&self) -> f32 {
        if self.progress.is_empty() {
            return 1.0;
        }
        self.progress.iter().sum::<f32>() / self.progress.len() as f32
    }
}

/// Upload page state
#[derive(Default)]
pub struct UploadState {
    /// Dataset new files are uploaded into
    pub target_dataset: Option<String>,
    /// Upload history, newest first
    pub history: Vec<UploadRecord>,
    pub active: Option<ActiveUpload>,
    /// Drop zone stays highlighted until this instant after a drop
    pub highlight_until: Option<Instant>,
}

impl UploadState {
    pub fn new(history: Vec<UploadRecord>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.active.is_some()
    }

    pub fn highlight(&mut self) {
        self.highlight_until = Some(Instant::now() + Duration::from_millis(500));
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }
}

/// Result of a settings change performed on a background thread
pub struct SettingsOutcome {
    pub label: String,
    pub result: Result<(), String>,
}

/// Settings page state
pub struct SettingsState {
    /// Editable copy of `dataset.auto_rename_key`
    pub rename_key_input: String,
    /// Settings writes still running
    pub pending: usize,
    pub(crate) outcome_sender: Sender<SettingsOutcome>,
    pub(crate) outcome_receiver: Receiver<SettingsOutcome>,
}

impl SettingsState {
    pub fn new(rename_key: String) -> Self {
        let (outcome_sender, outcome_receiver) = channel();
        Self {
            rename_key_input: rename_key,
            pending: 0,
            outcome_sender,
            outcome_receiver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub created_at: Instant,
}

/// Short-lived notifications shown in the top-right corner
#[derive(Default)]
pub struct ToastState {
    toasts: Vec<Toast>,
}

impl ToastState {
    pub const LIFETIME: Duration = Duration::from_secs(4);

    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.push(Toast {
            message: message.into(),
            level,
            created_at: Instant::now(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// Drop expired toasts
    pub fn prune(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.duration_since(t.created_at) < Self::LIFETIME);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let mut toasts = ToastState::default();
        toasts.info("saved");
        toasts.error("failed");
        assert_eq!(toasts.iter().count(), 2);

        toasts.prune(Instant::now());
        assert_eq!(toasts.iter().count(), 2);

        toasts.prune(Instant::now() + ToastState::LIFETIME + Duration::from_millis(1));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_upload_highlight() {
        let mut upload = UploadState::new(Vec::new());
        assert!(!upload.is_highlighted());
        upload.highlight();
        assert!(upload.is_highlighted());
        upload.highlight_until = Some(Instant::now() - Duration::from_millis(1));
        assert!(!upload.is_highlighted());
    }
}
