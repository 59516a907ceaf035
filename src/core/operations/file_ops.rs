use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Result type for file operations
pub type FileOpResult<T> = Result<T, FileOpError>;

/// Error types for file operations
#[derive(Debug)]
pub enum FileOpError {
    MissingDirectory,
    AlreadyExists(PathBuf),
    CopyFailed(String),
    IoError(std::io::Error),
}

impl std::fmt::Display for FileOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOpError::MissingDirectory => write!(f, "Cache directory is not set"),
            FileOpError::AlreadyExists(path) => write!(f, "{:?} already exists", path),
            FileOpError::CopyFailed(msg) => write!(f, "Copy failed: {}", msg),
            FileOpError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FileOpError {}

impl From<std::io::Error> for FileOpError {
    fn from(error: std::io::Error) -> Self {
        FileOpError::IoError(error)
    }
}

/// Copy `src` into `staging_dir` under `target_name`, creating the directory
/// if needed. Existing files are never overwritten.
///
/// # Arguments
/// * `src` - File picked or dropped by the user
/// * `staging_dir` - Cache directory from the dataset settings
/// * `target_name` - File name inside the cache directory
///
/// # Returns
/// * `Ok(PathBuf)` with the staged file path
/// * `Err(FileOpError)` if the directory is unset, the target exists or the copy failed
pub fn stage_file(src: &Path, staging_dir: &Path, target_name: &str) -> FileOpResult<PathBuf> {
    if staging_dir.as_os_str().is_empty() {
        return Err(FileOpError::MissingDirectory);
    }
    fs::create_dir_all(staging_dir)?;

    let dest = staging_dir.join(target_name);
    if dest.exists() {
        return Err(FileOpError::AlreadyExists(dest));
    }

    info!("Staging file {:?} as {:?}", src, dest);
    if let Err(e) = fs::copy(src, &dest) {
        error!("Failed to copy file from {:?} to {:?}: {}", src, dest, e);
        // Don't leave a partial copy behind
        let _ = fs::remove_file(&dest);
        return Err(FileOpError::CopyFailed(format!(
            "Failed to copy from {:?} to {:?}: {}",
            src, dest, e
        )));
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stage_file_creates_directory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photo.png");
        fs::write(&src, b"png").unwrap();
        let staging = dir.path().join("cache").join("nested");

        let staged = stage_file(&src, &staging, "img_001.png").unwrap();

        assert_eq!(staged, staging.join("img_001.png"));
        assert_eq!(fs::read(&staged).unwrap(), b"png");
        assert!(src.exists());
    }

    #[test]
    fn test_stage_file_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photo.png");
        fs::write(&src, b"new").unwrap();
        fs::write(dir.path().join("taken.png"), b"old").unwrap();

        let result = stage_file(&src, dir.path(), "taken.png");

        assert!(matches!(result, Err(FileOpError::AlreadyExists(_))));
        assert_eq!(fs::read(dir.path().join("taken.png")).unwrap(), b"old");
    }

    #[test]
    fn test_stage_file_requires_directory() {
        let result = stage_file(Path::new("photo.png"), Path::new(""), "photo.png");
        assert!(matches!(result, Err(FileOpError::MissingDirectory)));
    }

    #[test]
    fn test_stage_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = stage_file(&dir.path().join("gone.png"), dir.path(), "gone_copy.png");
        assert!(matches!(result, Err(FileOpError::CopyFailed(_))));
        assert!(!dir.path().join("gone_copy.png").exists());
    }
}
