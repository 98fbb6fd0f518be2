//! Filesystem-backed photo content store.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::PhotoError;

/// Stores photo content under a single root directory.
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a photo reference.
    pub fn path(&self, photo_ref: &str) -> PathBuf {
        self.root.join(photo_ref)
    }

    /// Writes photo content under the given reference. Uses O_EXCL
    /// creation so a retried upload can never clobber an existing file.
    pub fn store(&self, photo_ref: &str, content: &[u8]) -> Result<PathBuf, PhotoError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| PhotoError::CreateDirectory {
                path: self.root.clone(),
                source: e,
            })?;
        }

        let path = self.path(photo_ref);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| PhotoError::WriteFile {
                path: path.clone(),
                source: e,
            })?;
        file.write_all(content).map_err(|e| PhotoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Removes a stored photo. Used to roll back a failed append; errors
    /// are reported to the caller but the file may already be gone.
    pub fn remove(&self, photo_ref: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.path(photo_ref))
    }
}
