use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigEvent, ConfigStore, FieldValue, Section};
use crate::core::catalog::DatasetCatalog;
use crate::core::upload::{self, UploadJob, UploadProgressMessage};
use crate::database::{DatasetProvider, UploadHistoryProvider};
use crate::state::{
    ActiveUpload, DatasetPageState, Page, SettingsOutcome, SettingsState, ToastState, UploadState,
};
use crate::ui;

/// Simulated progress steps per uploaded file
const UPLOAD_STEPS: u32 = 20;
const UPLOAD_STEP_DELAY: Duration = Duration::from_millis(40);

pub struct DatasetSyncApp {
    // Core application state
    pub store: ConfigStore,
    config_events: Receiver<ConfigEvent>,
    pub catalog: DatasetCatalog,
    pub page: Page,
    pub dark_mode: bool,

    // Organized state modules
    pub datasets: DatasetPageState,
    pub upload: UploadState,
    pub settings: SettingsState,
    pub toasts: ToastState,
}

impl DatasetSyncApp {
    pub fn new<P>(store: ConfigStore, provider: &P) -> Self
    where
        P: DatasetProvider + UploadHistoryProvider,
    {
        let config_events = store.subscribe();
        let rename_key = store.read(|c| c.dataset.auto_rename_key.clone());
        let catalog = DatasetCatalog::new(provider.list_datasets());
        let mut upload = UploadState::new(provider.list_upload_history());
        upload.target_dataset = catalog.all().first().map(|d| d.name.clone());

        info!(
            "Loaded {} datasets and {} upload records",
            catalog.all().len(),
            upload.history.len()
        );

        Self {
            store,
            config_events,
            catalog,
            page: Page::default(),
            dark_mode: false,
            datasets: DatasetPageState::default(),
            upload,
            settings: SettingsState::new(rename_key),
            toasts: ToastState::default(),
        }
    }

    /// Persist one setting on a background thread; the outcome comes back
    /// through the settings channel and is shown as a toast
    pub fn persist_setting(
        &mut self,
        label: &str,
        section: Section,
        key: &'static str,
        value: impl Into<FieldValue>,
    ) {
        let store = self.store.clone();
        let sender = self.settings.outcome_sender.clone();
        let label = label.to_string();
        let value = value.into();
        self.settings.pending += 1;

        debug!("Persisting {}.{} = {:?}", section, key, value);
        thread::spawn(move || {
            let result = store
                .set_field(section, key, value)
                .map_err(|e| e.to_string());
            let _ = sender.send(SettingsOutcome { label, result });
        });
    }

    /// Let the user pick a directory and store it in `dataset.<key>`
    pub fn change_directory(&mut self, label: &str, key: &'static str) {
        let current = match self.store.get_field(Section::Dataset, key) {
            Ok(FieldValue::Text(dir)) => dir,
            _ => String::new(),
        };

        let mut dialog = rfd::FileDialog::new().set_title(format!("Choose {}", label.to_lowercase()));
        if !current.is_empty() {
            dialog = dialog.set_directory(&current);
        }
        match dialog.pick_folder() {
            Some(dir) => {
                let dir = dir.to_string_lossy().into_owned();
                self.persist_setting(label, Section::Dataset, key, dir);
            }
            None => debug!("Directory selection cancelled"),
        }
    }

    pub fn search_datasets(&mut self, keyword: &str) {
        self.catalog.search(keyword);
        debug!(
            "Search {:?} matched {} datasets",
            keyword,
            self.catalog.visible_count()
        );
    }

    pub fn create_dataset(&mut self) {
        let name = self.datasets.new_dataset_name.clone();
        match self.catalog.create(&name) {
            Ok(created) => {
                info!("Created dataset {:?} (id {})", created.name, created.id);
                self.toasts
                    .info(format!("Dataset \"{}\" created", created.name));
                self.datasets.show_create_dialog = false;
                self.datasets.new_dataset_name.clear();
                self.datasets.create_error = None;
            }
            Err(e) => {
                warn!("Rejected new dataset name {:?}: {}", name, e);
                self.datasets.create_error = Some(e.to_string());
            }
        }
    }

    /// Check `files` against the current dataset settings and start uploading
    /// the accepted ones
    pub fn start_upload(&mut self, files: Vec<PathBuf>) {
        if files.is_empty() {
            return;
        }
        if self.upload.is_uploading() {
            self.toasts.warning("An upload is already running");
            return;
        }
        let Some(dataset_name) = self.upload.target_dataset.clone() else {
            self.toasts.warning("Choose a dataset first");
            return;
        };

        let prefs = self.store.read(|c| c.dataset.clone());
        let plan = upload::plan_uploads(&files, &prefs, chrono::Local::now());

        for (path, reason) in &plan.rejected {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            self.toasts.warning(format!("Skipped {}: {}", name, reason));
        }
        if plan.accepted.is_empty() {
            return;
        }

        info!(
            "Uploading {} files into {:?}",
            plan.accepted.len(),
            dataset_name
        );
        let names = plan
            .accepted
            .iter()
            .map(|p| p.target_name.clone())
            .collect::<Vec<_>>();
        let progress = vec![0.0; names.len()];
        let handle = upload::spawn_upload(UploadJob {
            dataset_name,
            staging_dir: PathBuf::from(prefs.tmp_dir),
            items: plan.accepted,
            steps: UPLOAD_STEPS,
            step_delay: UPLOAD_STEP_DELAY,
        });

        self.upload.active = Some(ActiveUpload {
            handle,
            names,
            progress,
        });
    }

    pub fn cancel_upload(&mut self) {
        info!("User requested upload cancellation");
        if let Some(active) = &self.upload.active {
            active.handle.cancel();
        }
    }

    /// Drain messages from background threads; runs once per frame
    fn poll_background(&mut self) {
        while let Ok(outcome) = self.settings.outcome_receiver.try_recv() {
            self.settings.pending = self.settings.pending.saturating_sub(1);
            match outcome.result {
                Ok(()) => self.toasts.info(format!("{} saved", outcome.label)),
                Err(e) => {
                    error!("Failed to change setting {}: {}", outcome.label, e);
                    self.toasts
                        .error(format!("Could not save {}: {}", outcome.label, e));
                }
            }
        }

        while let Ok(event) = self.config_events.try_recv() {
            match event {
                ConfigEvent::Reloaded => {
                    self.settings.rename_key_input =
                        self.store.read(|c| c.dataset.auto_rename_key.clone());
                    self.toasts.info("Settings reloaded from disk");
                }
                ConfigEvent::ReloadFailed { error } => {
                    self.toasts
                        .error(format!("Settings file is invalid, keeping previous values: {}", error));
                }
                ConfigEvent::Saved { section, key } => {
                    debug!("Setting {}.{} written", section, key);
                }
            }
        }

        self.poll_upload();
    }

    fn poll_upload(&mut self) {
        let mut finished = None;
        if let Some(active) = &mut self.upload.active {
            while let Ok(message) = active.handle.receiver.try_recv() {
                match message {
                    UploadProgressMessage::Progress { index, fraction } => {
                        if let Some(p) = active.progress.get_mut(index) {
                            *p = fraction;
                        }
                    }
                    UploadProgressMessage::Finished { index, record } => {
                        if let Some(p) = active.progress.get_mut(index) {
                            *p = 1.0;
                        }
                        self.upload.history.insert(0, record);
                    }
                    UploadProgressMessage::Complete(stats) => {
                        finished = Some((stats, false));
                    }
                    UploadProgressMessage::Cancelled(stats) => {
                        finished = Some((stats, true));
                    }
                }
            }
        }

        // Handle completion outside of the borrow
        if let Some((stats, cancelled)) = finished {
            self.upload.active = None;
            if cancelled {
                self.toasts.warning(format!(
                    "Upload cancelled after {} files",
                    stats.succeeded + stats.failed
                ));
            } else if stats.failed > 0 {
                self.toasts.error(format!(
                    "Upload finished: {} succeeded, {} failed",
                    stats.succeeded, stats.failed
                ));
            } else {
                self.toasts
                    .info(format!("Uploaded {} files", stats.succeeded));
            }
        }
    }

    fn busy(&self) -> bool {
        self.settings.pending > 0 || self.upload.is_uploading() || !self.toasts.is_empty()
    }
}

impl eframe::App for DatasetSyncApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background();
        self.toasts.prune(Instant::now());

        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        ui::render_sidebar(self, ctx);
        match self.page {
            Page::Datasets => {
                ui::render_dataset_page(self, ctx);
                ui::render_create_dataset_dialog(self, ctx);
            }
            Page::Upload => ui::render_upload_page(self, ctx),
            Page::Settings => ui::render_settings_page(self, ctx),
        }
        ui::render_toasts(self, ctx);

        // Background threads and the config watcher don't wake the UI, so poll
        ctx.request_repaint_after(if self.busy() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(500)
        });
    }
}
