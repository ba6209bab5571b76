//! Load-all / replace-all persistence for the model catalog.
//!
//! The whole collection lives in one JSON document; every operation reads
//! the full sequence and every write replaces it. There is no locking:
//! interleaved read-modify-write cycles are last-write-wins, which is the
//! accepted behavior of this store (see the race test at the bottom).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use vitrina_core::Document;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read data file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data file {path} is not a valid model collection: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write data file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Storage seam injected into the HTTP handlers.
///
/// Handlers never touch the filesystem directly; tests substitute
/// [`MemoryStore`] to observe post-conditions without temp files.
pub trait ModelStore: Send + Sync {
    /// Reads the entire collection.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing data is missing or not a
    /// valid JSON array of objects.
    fn load(&self) -> Result<Vec<Document>, StorageError>;

    /// Replaces the entire collection.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backing data cannot be written.
    fn save(&self, records: &[Document]) -> Result<(), StorageError>;
}

/// File-backed store over a single JSON array document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Document>, StorageError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, records: &[Document]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(records).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store with the same load-all / replace-all semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Document>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(records: Vec<Document>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl ModelStore for MemoryStore {
    fn load(&self) -> Result<Vec<Document>, StorageError> {
        let guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save(&self, records: &[Document]) -> Result<(), StorageError> {
        let mut guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = records.to_vec();
        Ok(())
    }
}
