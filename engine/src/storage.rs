//! Persistent storage for the offline queue.
//!
//! A storage instance holds one serialized document (the whole queue).
//! Implementations use interior mutability so a queue can be shared.

use crate::{error::Result, Error};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name used by [`FileStorage::in_dir`].
pub const QUEUE_FILE_NAME: &str = "offline-queue.json";

/// A single durable slot holding the serialized queue.
pub trait QueueStorage: Send + Sync {
    /// Read the stored document, `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored document.
    fn save(&self, contents: &str) -> Result<()>;

    /// Remove the stored document.
    fn clear(&self) -> Result<()>;
}

/// In-memory storage, optionally with a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects documents larger than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            contents: Mutex::new(None),
            quota: Some(bytes),
        }
    }

    /// Storage pre-filled with a raw document (possibly corrupt).
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            quota: None,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl QueueStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(limit) = self.quota {
            if contents.len() > limit {
                return Err(Error::QuotaExceeded {
                    requested: contents.len(),
                    limit,
                });
            }
        }
        *self.slot() = Some(contents.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Storage backed by a JSON file. Writes go to a temporary sibling file
/// that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at [`QUEUE_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(QUEUE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl QueueStorage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
