use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use super::error::ConfigResult;

/// Watches a single config file for modifications
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by writing a new file and renaming it over the old one
/// are still noticed.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl ConfigWatcher {
    /// Start watching `file`; `on_change` runs on the watcher thread
    pub fn new<F>(file: &Path, on_change: F) -> ConfigResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = file.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if touches_file(&event, file_name.as_ref()) {
                        debug!("Config change detected: {:?}", event.kind);
                        on_change();
                    }
                }
                Err(e) => {
                    error!("File watching error: {}", e);
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!("Watching {:?} for config changes", dir);

        Ok(Self {
            _watcher: watcher,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn touches_file(event: &Event, file_name: Option<&OsString>) -> bool {
    let Some(file_name) = file_name else {
        return false;
    };
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
