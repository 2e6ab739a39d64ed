//! Default locations and directory checks for the cache.

mod error;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use error::PathError;

/// Directory under the platform data dir that holds the cache.
pub const DEFAULT_CACHE_DIR_RELATIVE: &str = "stowage/cache";

/// Default cache directory: `<data dir>/stowage/cache`.
pub fn default_cache_dir() -> Result<PathBuf, PathError> {
    dirs::data_dir()
        .map(|dir| dir.join(DEFAULT_CACHE_DIR_RELATIVE))
        .ok_or(PathError::NoDataDir)
}

/// Create `path` (and parents) if missing and verify it is a writable directory.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    verify_writable(path)
}

/// Verify a directory is writable by creating and removing a probe file.
pub fn verify_writable(path: &Path) -> Result<(), PathError> {
    let probe = path.join(".stowage_write_test");
    let result = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&probe)
        .and_then(|mut file| file.write_all(b"test"));

    match result {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(err) => Err(PathError::NotWritable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}
