use directories::ProjectDirs;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::formatter::BracketedFormatter;

/// Install the global subscriber: bracketed output to stdout and to a
/// timestamped log file. Returns the log file path, or `None` when the file
/// could not be created and only stdout is used.
pub fn setup_logging() -> Option<PathBuf> {
    let (file_layer, log_file) = match open_log_file() {
        Ok((file, path)) => {
            let layer = fmt::layer()
                .event_format(BracketedFormatter)
                .with_writer(Mutex::new(file))
                .with_ansi(false); // Disable ANSI colors in file
            (Some(layer), Ok(path))
        }
        Err(e) => (None, Err(e)),
    };

    let stdout_layer = fmt::layer()
        .event_format(BracketedFormatter)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter()))
        .with(file_layer)
        .with(stdout_layer)
        .init();

    info!("Starting Dataset-Sync");
    match log_file {
        Ok(path) => {
            info!("Log file created at: {:?}", path);
            Some(path)
        }
        Err(e) => {
            warn!("Logging to stdout only, could not create log file: {}", e);
            None
        }
    }
}

// Keep our app at trace level, but suppress verbose third-party logs
fn default_filter() -> EnvFilter {
    let mut filter = EnvFilter::new("trace");
    for directive in ["winit=warn", "log=warn", "egui=warn", "eframe=warn", "notify=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn log_dir() -> PathBuf {
    ProjectDirs::from("", "", "dataset-sync")
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn open_log_file() -> io::Result<(File, PathBuf)> {
    let dir = log_dir();
    fs::create_dir_all(&dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("dataset_sync_{}.log", timestamp));
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)?;

    Ok((file, path))
}
