use std::path::PathBuf;

use thiserror::Error;

use crate::models::task::Task;

pub mod json;
#[cfg(test)]
pub mod memory;

/// Key the whole task collection is stored under
pub const TASKS_KEY: &str = "tasks";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load store from '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save store to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize to JSON: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable string key-value store
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// Returns `None` when nothing usable is stored; read and parse failures are
/// logged and swallowed.
pub fn load_tasks(storage: &impl Storage) -> Option<Vec<Task>> {
    let raw = match storage.get_item(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable task store: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => {
            tracing::debug!(count = tasks.len(), "Loaded tasks");
            Some(tasks)
        }
        Err(e) => {
            tracing::warn!("Ignoring unparseable tasks entry: {}", e);
            None
        }
    }
}

pub fn save_tasks(storage: &impl Storage, tasks: &[Task]) -> Result<(), StorageError> {
    let json =
        serde_json::to_string(tasks).map_err(|e| StorageError::SerializeFailed { source: e })?;
    storage.set_item(TASKS_KEY, &json)?;
    tracing::debug!(count = tasks.len(), "Saved tasks");
    Ok(())
}
