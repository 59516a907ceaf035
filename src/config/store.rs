use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_yaml::Value;
use tracing::{debug, error, info, warn};

use super::document;
use super::error::{ConfigError, ConfigResult};
use super::fields::{self, FieldValue, Section};
use super::schema::Configuration;
use super::watcher::ConfigWatcher;

/// Notifications emitted by [`ConfigStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// The file was changed externally and the new content is live
    Reloaded,
    /// The file was changed externally but could not be parsed; the previous
    /// configuration stays live
    ReloadFailed { error: String },
    /// A field was changed through [`ConfigStore::set_field`] and written out
    Saved { section: Section, key: String },
}

/// Shared handle to the application configuration and its backing file
///
/// Cloning the handle is cheap; all clones see the same configuration. One
/// mutex guards the in-memory record and every read or write of the file, so
/// a reload triggered by the watcher never interleaves with `set_field`.
#[derive(Clone)]
pub struct ConfigStore {
    shared: Arc<Shared>,
}

struct Shared {
    path: PathBuf,
    state: Mutex<StoreState>,
    subscribers: Mutex<Vec<Sender<ConfigEvent>>>,
    watcher: Mutex<Option<ConfigWatcher>>,
}

struct StoreState {
    config: Configuration,
    /// Raw document as last read or written, including unmodelled keys
    document: Value,
    /// Exact text of the last write or applied reload; used to recognise
    /// watcher events caused by our own writes
    last_seen: Option<String>,
    /// Whether the most recent external reload failed
    degraded: bool,
}

impl ConfigStore {
    /// Load the config file at `path` and start watching it for external edits
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let store = Self::open(path)?;
        store.watch()?;
        Ok(store)
    }

    /// Load the config file at `path` without installing a watcher
    pub fn open(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Loading configuration from: {:?}", path);

        let text = read_file(&path)?;
        let (config, document) = parse(&path, &text)?;
        info!("Configuration loaded successfully");

        Ok(Self {
            shared: Arc::new(Shared {
                path,
                state: Mutex::new(StoreState {
                    config,
                    document,
                    last_seen: Some(text),
                    degraded: false,
                }),
                subscribers: Mutex::new(Vec::new()),
                watcher: Mutex::new(None),
            }),
        })
    }

    /// Install the file watcher; external edits are reloaded in the background
    pub fn watch(&self) -> ConfigResult<()> {
        let mut slot = self.shared.watcher.lock();
        if slot.is_some() {
            return Ok(());
        }

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let watcher = ConfigWatcher::new(&self.shared.path, move || {
            if let Some(shared) = weak.upgrade() {
                // Errors are logged by reload; no caller waits on a background reload
                let _ = ConfigStore { shared }.reload();
            }
        })?;
        debug!("Config watcher installed on {:?}", watcher.dir());
        *slot = Some(watcher);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> Configuration {
        self.shared.state.lock().config.clone()
    }

    /// Run `f` against the current configuration while holding the lock
    pub fn read<R>(&self, f: impl FnOnce(&Configuration) -> R) -> R {
        f(&self.shared.state.lock().config)
    }

    /// Whether the last external reload failed and an older configuration is live
    pub fn is_degraded(&self) -> bool {
        self.shared.state.lock().degraded
    }

    /// Receive reload and save notifications
    pub fn subscribe(&self) -> Receiver<ConfigEvent> {
        let (tx, rx) = channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    /// Current value of `section.key`
    pub fn get_field(&self, section: Section, key: &str) -> ConfigResult<FieldValue> {
        let descriptor = fields::lookup(section, key).ok_or_else(|| ConfigError::FieldNotFound {
            section,
            field: key.to_string(),
        })?;
        self.read(|config| descriptor.get(config))
            .ok_or_else(|| ConfigError::FieldNotFound {
                section,
                field: key.to_string(),
            })
    }

    /// Set `section.key` to `value` and write the file
    ///
    /// Nothing changes, in memory or on disk, unless the field exists, is
    /// writable, has the same type as `value`, and the write succeeds.
    pub fn set_field(
        &self,
        section: Section,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> ConfigResult<()> {
        let value = value.into();
        {
            let mut state = self.shared.state.lock();

            let descriptor =
                fields::lookup(section, key).ok_or_else(|| ConfigError::FieldNotFound {
                    section,
                    field: key.to_string(),
                })?;
            if !descriptor.writable {
                return Err(ConfigError::ReadOnlyField {
                    section,
                    field: key.to_string(),
                });
            }
            if descriptor.kind != value.kind() {
                return Err(ConfigError::TypeMismatch {
                    section,
                    field: key.to_string(),
                    expected: descriptor.kind,
                    found: value.kind(),
                });
            }

            // Pick up external edits first so the write doesn't hide them
            let external = self.shared.refresh_locked(&mut state);
            if descriptor.get(&state.config).is_none() {
                drop(state);
                self.shared.announce(external);
                return Err(ConfigError::FieldNotFound {
                    section,
                    field: key.to_string(),
                });
            }

            let mut candidate = state.config.clone();
            let result = descriptor
                .set(&mut candidate, value)
                .map_err(|reason| ConfigError::InvalidValue {
                    section,
                    field: key.to_string(),
                    reason,
                })
                .and_then(|()| self.shared.persist(&mut state, candidate));
            drop(state);

            self.shared.announce(external);
            result?;
        }

        info!("Updated setting {}.{}", section, key);
        self.shared.notify(ConfigEvent::Saved {
            section,
            key: key.to_string(),
        });
        Ok(())
    }

    /// Write every writable field back to the file, keeping unmodelled keys
    pub fn save(&self) -> ConfigResult<()> {
        let mut state = self.shared.state.lock();
        let external = self.shared.refresh_locked(&mut state);
        let current = state.config.clone();
        let result = self.shared.persist(&mut state, current);
        drop(state);

        self.shared.announce(external);
        result
    }

    /// Re-read the file and replace the live configuration
    ///
    /// Returns `Ok(false)` when the file content is what this store last wrote
    /// or loaded. On a parse failure the previous configuration stays live and
    /// the store is marked degraded.
    pub fn reload(&self) -> ConfigResult<bool> {
        let result = {
            let mut state = self.shared.state.lock();
            self.shared.reload_locked(&mut state)
        };

        let event = self.shared.log_reload(&result);
        self.shared.announce(event);
        result
    }
}

impl Shared {
    /// Apply any external edit before a write; the event is sent once the
    /// lock is released
    fn refresh_locked(&self, state: &mut StoreState) -> Option<ConfigEvent> {
        let result = self.reload_locked(state);
        self.log_reload(&result)
    }

    fn log_reload(&self, result: &ConfigResult<bool>) -> Option<ConfigEvent> {
        match result {
            Ok(true) => {
                info!("Configuration reloaded from {:?}", self.path);
                Some(ConfigEvent::Reloaded)
            }
            Ok(false) => None,
            Err(e) => {
                error!("Failed to reload configuration: {}", e);
                warn!("Keeping previous configuration");
                Some(ConfigEvent::ReloadFailed {
                    error: e.to_string(),
                })
            }
        }
    }

    fn announce(&self, event: Option<ConfigEvent>) {
        if let Some(event) = event {
            self.notify(event);
        }
    }

    fn reload_locked(&self, state: &mut StoreState) -> ConfigResult<bool> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            // Editors that save by rename leave the file missing for a moment
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Config file {:?} is missing, waiting for the next change", self.path);
                return Ok(false);
            }
            Err(source) => {
                state.degraded = true;
                return Err(ConfigError::Load {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if state.last_seen.as_deref() == Some(text.as_str()) {
            debug!("Config file unchanged, skipping reload");
            return Ok(false);
        }
        // Truncated by a writer that has not finished yet
        if text.trim().is_empty() {
            debug!("Config file is empty, waiting for the next change");
            return Ok(false);
        }

        match parse(&self.path, &text) {
            Ok((config, document)) => {
                state.config = config;
                state.document = document;
                state.last_seen = Some(text);
                state.degraded = false;
                Ok(true)
            }
            Err(e) => {
                state.degraded = true;
                Err(e)
            }
        }
    }

    /// Write `candidate` to disk and make it live; `state` is untouched on failure
    ///
    /// The caller has already refreshed `state` from disk, so the cached
    /// document carries every key other tools wrote.
    fn persist(&self, state: &mut StoreState, candidate: Configuration) -> ConfigResult<()> {
        let mut document = state.document.clone();
        document::merge_owned(&mut document, &candidate);

        let text = serde_yaml::to_string(&document).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        if let Err(e) = fs::write(&self.path, &text) {
            error!("Failed to write config file {:?}: {}", self.path, e);
            return Err(ConfigError::Write {
                path: self.path.clone(),
                message: e.to_string(),
            });
        }
        debug!("Config written to {:?}", self.path);

        state.config = candidate;
        state.document = document;
        state.last_seen = Some(text);
        state.degraded = false;
        Ok(())
    }

    fn notify(&self, event: ConfigEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn read_file(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(path: &Path, text: &str) -> ConfigResult<(Configuration, Value)> {
    let config = serde_yaml::from_str::<Configuration>(text).map_err(|source| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let document = serde_yaml::from_str::<Value>(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((config, document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"app:
  name: Dataset-Sync
  version: 1.0.0
  description: image dataset manager
  author: WMGray
  startup: window
dataset:
  tmp_dir: ./tmp
  save_dir: ./datasets
  auto_rename: false
  auto_rename_key: img
  retention_days: 30
ui:
  theme: light
"#;

    fn write_sample(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        condition()
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = ConfigStore::open(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, "dataset:\n  auto_rename: [not, a, bool]\n");
        let result = ConfigStore::open(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);

        let first = ConfigStore::open(&path).unwrap();
        first.save().unwrap();
        let second = ConfigStore::open(&path).unwrap();

        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(second.snapshot().dataset.save_dir, "./datasets");
    }

    #[test]
    fn test_set_field_auto_rename_persists() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        assert!(!store.snapshot().dataset.auto_rename);

        store.set_field(Section::Dataset, "auto_rename", true).unwrap();

        assert!(store.snapshot().dataset.auto_rename);
        let on_disk: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            document::get_key(&on_disk, "dataset", "auto_rename"),
            Some(&Value::Bool(true))
        );
        assert!(ConfigStore::open(&path).unwrap().snapshot().dataset.auto_rename);
    }

    #[test]
    fn test_set_field_preserves_unmodelled_keys() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();

        store.set_field(Section::Dataset, "save_dir", "/a").unwrap();

        let on_disk: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            document::get_key(&on_disk, "dataset", "retention_days"),
            Some(&Value::Number(30i64.into()))
        );
        assert_eq!(
            document::get_key(&on_disk, "ui", "theme"),
            Some(&Value::String("light".to_string()))
        );
        assert_eq!(
            document::get_key(&on_disk, "app", "author"),
            Some(&Value::String("WMGray".to_string()))
        );
    }

    #[test]
    fn test_set_field_unknown_name_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        let before = store.snapshot();

        let result = store.set_field(Section::Dataset, "SaveDir", "/a");

        assert!(matches!(result, Err(ConfigError::FieldNotFound { .. })));
        assert_eq!(store.snapshot(), before);
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_set_field_type_mismatch_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        let before = store.snapshot();

        let result = store.set_field(Section::Dataset, "auto_rename", "yes");

        assert!(matches!(result, Err(ConfigError::TypeMismatch { .. })));
        assert_eq!(store.snapshot(), before);
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_set_field_read_only_and_missing_section() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();

        assert!(matches!(
            store.set_field(Section::App, "name", "Other"),
            Err(ConfigError::ReadOnlyField { .. })
        ));
        assert!(matches!(
            store.set_field(Section::Mysql, "host", "db.local"),
            Err(ConfigError::FieldNotFound { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_set_field_write_failure_keeps_memory() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();

        // Replace the file with a directory so the write fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let result = store.set_field(Section::Dataset, "save_dir", "/a");
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert_eq!(store.snapshot().dataset.save_dir, "./datasets");
    }

    #[test]
    fn test_get_field() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();

        assert_eq!(
            store.get_field(Section::Dataset, "auto_rename_key").unwrap(),
            FieldValue::Text("img".to_string())
        );
        assert!(store.get_field(Section::Mysql, "port").is_err());
    }

    #[test]
    fn test_reload_failure_keeps_previous_config() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        let events = store.subscribe();

        fs::write(&path, "dataset: [broken\n").unwrap();
        assert!(store.reload().is_err());

        assert!(store.is_degraded());
        assert_eq!(store.snapshot().dataset.save_dir, "./datasets");
        assert!(matches!(
            events.try_recv(),
            Ok(ConfigEvent::ReloadFailed { .. })
        ));

        fs::write(&path, SAMPLE.replace("./datasets", "/fixed")).unwrap();
        assert!(store.reload().unwrap());
        assert!(!store.is_degraded());
        assert_eq!(store.snapshot().dataset.save_dir, "/fixed");
        assert_eq!(events.try_recv(), Ok(ConfigEvent::Reloaded));
    }

    #[test]
    fn test_reload_skips_own_write() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();

        store.set_field(Section::Dataset, "tmp_dir", "/scratch").unwrap();
        assert!(!store.reload().unwrap());
    }

    #[test]
    fn test_saved_event_emitted() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        let events = store.subscribe();

        store.set_field(Section::Dataset, "auto_rename_key", "cap").unwrap();

        assert_eq!(
            events.try_recv(),
            Ok(ConfigEvent::Saved {
                section: Section::Dataset,
                key: "auto_rename_key".to_string(),
            })
        );
    }

    fn description_on_disk(path: &Path) -> Option<String> {
        let doc: Value = serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        document::get_key(&doc, "app", "description")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    #[test]
    fn test_set_field_picks_up_pending_external_edit() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        let events = store.subscribe();

        // Edited by another process, not yet reloaded
        fs::write(&path, SAMPLE.replace("image dataset manager", "edited elsewhere")).unwrap();
        store.set_field(Section::Dataset, "save_dir", "/a").unwrap();

        assert!(!store.reload().unwrap());
        assert_eq!(store.snapshot().app.description, "edited elsewhere");
        assert_eq!(store.snapshot().dataset.save_dir, "/a");
        assert_eq!(
            description_on_disk(&path).as_deref(),
            Some("edited elsewhere")
        );
        assert_eq!(
            ConfigStore::open(&path).unwrap().snapshot().dataset.save_dir,
            "/a"
        );

        assert_eq!(events.try_recv(), Ok(ConfigEvent::Reloaded));
        assert!(matches!(events.try_recv(), Ok(ConfigEvent::Saved { .. })));
    }

    #[test]
    fn test_external_edit_after_set_field_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();

        store.set_field(Section::Dataset, "save_dir", "/a").unwrap();
        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("image dataset manager", "edited elsewhere");
        fs::write(&path, edited).unwrap();

        assert!(store.reload().unwrap());
        assert_eq!(store.snapshot().app.description, "edited elsewhere");
        assert_eq!(store.snapshot().dataset.save_dir, "/a");
    }

    #[test]
    fn test_reload_while_file_missing_is_not_a_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::open(&path).unwrap();
        let events = store.subscribe();

        // Save by rename: the old file moves away before the new one lands
        fs::rename(&path, dir.path().join("config.yaml~")).unwrap();
        assert!(!store.reload().unwrap());
        assert!(!store.is_degraded());
        assert!(events.try_recv().is_err());

        fs::write(&path, SAMPLE.replace("auto_rename: false", "auto_rename: true")).unwrap();
        assert!(store.reload().unwrap());
        assert!(store.snapshot().dataset.auto_rename);
        assert_eq!(events.try_recv(), Ok(ConfigEvent::Reloaded));
    }

    #[test]
    fn test_watcher_rename_save_reports_no_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::load(&path).unwrap();
        let events = store.subscribe();

        fs::rename(&path, dir.path().join("config.yaml~")).unwrap();
        fs::write(&path, SAMPLE.replace("auto_rename: false", "auto_rename: true")).unwrap();

        let mut seen = Vec::new();
        assert!(wait_for(|| {
            while let Ok(event) = events.try_recv() {
                seen.push(event);
            }
            seen.contains(&ConfigEvent::Reloaded)
        }));
        assert!(!seen
            .iter()
            .any(|e| matches!(e, ConfigEvent::ReloadFailed { .. })));
        assert!(!store.is_degraded());
        assert!(store.read(|c| c.dataset.auto_rename));
    }

    #[test]
    fn test_external_edit_keeps_earlier_set_field() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::load(&path).unwrap();

        store.set_field(Section::Dataset, "save_dir", "/a").unwrap();

        // Another process edits an unrelated key
        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("image dataset manager", "edited elsewhere");
        fs::write(&path, edited).unwrap();

        assert!(wait_for(|| store.read(|c| {
            c.app.description == "edited elsewhere" && c.dataset.save_dir == "/a"
        })));
    }

    #[test]
    fn test_watcher_applies_external_change() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, SAMPLE);
        let store = ConfigStore::load(&path).unwrap();
        let events = store.subscribe();

        fs::write(&path, SAMPLE.replace("auto_rename: false", "auto_rename: true")).unwrap();

        assert!(wait_for(|| store.read(|c| c.dataset.auto_rename)));
        assert!(wait_for(|| matches!(events.try_recv(), Ok(ConfigEvent::Reloaded))));
    }
}
