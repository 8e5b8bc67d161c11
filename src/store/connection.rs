use crate::config::StorageConfig;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Flat JSON file store rooted at the log directory, one subdirectory
/// per participant.
///
/// Read-modify-write appends are serialized through a single writer lock,
/// so concurrent requests for the same participant and day cannot drop
/// each other's entries.
#[derive(Debug)]
pub struct LogStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl LogStore {
    pub fn open(config: &StorageConfig) -> StoreResult<Self> {
        Self::open_at(&config.log_dir)
    }

    pub fn open_at(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        info!("Opening log store at {}", root.display());
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn writer(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), so a poisoned lock carries no broken state.
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}
