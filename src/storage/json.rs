use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::storage::{Storage, StorageError};

/// Number of previous store files kept under `backups/`
const BACKUPS_TO_KEEP: usize = 5;

type Items = BTreeMap<String, String>;

/// Key-value store kept as a single JSON object of string values
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_items(&self) -> Result<Items, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                path: self.path.clone(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Items::new()),
            Err(e) => Err(StorageError::LoadFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })?;
        Ok(())
    }

    fn create_backup(&self) -> Result<u64, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(0);
        }

        let backup_path = self.get_backup_path();
        match fs::copy(&self.path, &backup_path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_backup_dir()?;
                self.create_backup()
            }
            Err(e) => Err(StorageError::BackupFailed {
                path: backup_path,
                source: e,
            }),
            Ok(bytes) => Ok(bytes),
        }
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let mut backups = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        if backups.len() <= BACKUPS_TO_KEEP {
            return Ok(());
        }

        // Names end in a fixed-width timestamp, so oldest sorts first
        backups.sort();
        let excess = backups.len() - BACKUPS_TO_KEEP;
        for backup in &backups[..excess] {
            fs::remove_file(backup).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }
        tracing::debug!(removed = excess, "Pruned old backups");

        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn get_backup_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("store"));
        let stamp = jiff::Timestamp::now().as_nanosecond();

        self.get_backup_dir()
            .join(format!("{}.{:020}", file_name, stamp))
    }
}

impl Storage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut items = self.read_items()?;
        Ok(items.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        // A corrupt store is replaced; the previous file survives as a backup.
        // Any other read failure aborts before anything is written.
        let mut items = match self.read_items() {
            Ok(items) => items,
            Err(e @ StorageError::ParseFailed { .. }) => {
                tracing::warn!("Overwriting unreadable store: {}", e);
                Items::new()
            }
            Err(e) => return Err(e),
        };
        items.insert(key.to_string(), value.to_string());

        let json =
            to_string_pretty(&items).map_err(|e| StorageError::SerializeFailed { source: e })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        let temp_path = PathBuf::from(format!("{}.tmp.{}", self.path.display(), Uuid::new_v4()));
        write(&temp_path, json).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::SaveFailed {
                path: temp_path.clone(),
                source: e,
            }
        })?;

        rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::SaveFailed {
                path: self.path.clone(),
                source: e,
            }
        })?;
        tracing::debug!(key, path = %self.path.display(), "Wrote store");

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{TASKS_KEY, load_tasks};

    fn backup_count(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .count()
    }

    #[test]
    fn test_set_and_get_item() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));

        storage.set_item(TASKS_KEY, "[]").unwrap();
        storage.set_item("other", "value").unwrap();

        assert_eq!(storage.get_item(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.get_item("other").unwrap().as_deref(), Some("value"));
        assert_eq!(storage.get_item("missing").unwrap(), None);
    }

    #[test]
    fn test_missing_file_has_no_items() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));

        assert_eq!(storage.get_item(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn test_invalid_json_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let storage = JsonFileStorage::new(path);

        match storage.get_item(TASKS_KEY) {
            Err(StorageError::ParseFailed { .. }) => {}
            _ => panic!("Expected ParseFailed error, got something else"),
        }
        assert!(load_tasks(&storage).is_none());
    }

    #[test]
    fn test_set_item_replaces_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "garbage").unwrap();

        let storage = JsonFileStorage::new(path);
        storage.set_item(TASKS_KEY, "[]").unwrap();

        assert_eq!(storage.get_item(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(backup_count(&dir.path().join("backups")), 1);
    }

    #[test]
    fn test_backup_creation_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));

        for i in 1..=7 {
            storage.set_item(TASKS_KEY, &format!("[{}]", i)).unwrap();
        }

        assert_eq!(
            backup_count(&dir.path().join("backups")),
            BACKUPS_TO_KEEP,
            "Should keep exactly 5 backups"
        );
        assert_eq!(storage.get_item(TASKS_KEY).unwrap().as_deref(), Some("[7]"));
    }

    #[test]
    fn test_backup_directory_created_on_second_save() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));
        let backups_dir = dir.path().join("backups");

        storage.set_item(TASKS_KEY, "[]").unwrap();
        assert!(
            !backups_dir.exists(),
            "Backups dir should not exist after first save"
        );

        storage.set_item(TASKS_KEY, "[]").unwrap();
        assert!(backups_dir.is_dir(), "Backups dir should exist after second save");
    }

    fn leftover_temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .count()
    }

    #[test]
    fn test_unreadable_store_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the store file fails with an I/O error, not a parse error
        let path = dir.path().join("store.json");
        fs::create_dir(&path).unwrap();

        let storage = JsonFileStorage::new(path.clone());

        match storage.set_item(TASKS_KEY, "[]") {
            Err(StorageError::LoadFailed { .. }) => {}
            other => panic!("Expected LoadFailed error, got {:?}", other),
        }
        assert!(path.is_dir());
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }

    #[test]
    fn test_failed_backup_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));
        storage.set_item(TASKS_KEY, "[1]").unwrap();
        // A plain file where the backups directory should be makes the backup step fail
        fs::write(dir.path().join("backups"), "").unwrap();

        match storage.set_item(TASKS_KEY, "[2]") {
            Err(StorageError::BackupFailed { .. }) => {}
            other => panic!("Expected BackupFailed error, got {:?}", other),
        }
        assert_eq!(leftover_temp_files(dir.path()), 0);
        assert_eq!(storage.get_item(TASKS_KEY).unwrap().as_deref(), Some("[1]"));
    }
}
