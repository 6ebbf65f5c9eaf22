use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::warn;

use crate::error::ClientError;

/// Durable string key/value entries, the client's equivalent of browser local storage.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;

    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Entries kept in a single JSON object on disk, rewritten on every change.
pub struct FileStorage {
    file_path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    pub fn open(file_path: impl Into<PathBuf>) -> FileStorage {
        let file_path = file_path.into();
        let entries = match Self::load_entries(&file_path) {
            Ok(entries) => entries,
            Err(ClientError::Storage(e)) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Ignoring unreadable storage file {}: {}", file_path.display(), e);
                HashMap::new()
            }
        };

        FileStorage {
            file_path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_entries(file_path: &Path) -> Result<HashMap<String, String>, ClientError> {
        let content = fs::read_to_string(file_path)?;
        serde_json::from_str(&content).map_err(ClientError::StorageFormat)
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json_string = serde_json::to_string_pretty(entries).map_err(ClientError::StorageFormat)?;
        fs::write(&self.file_path, json_string)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientError::Config("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientError::Config("storage lock poisoned".to_string()))?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl<S: LocalStorage + ?Sized> LocalStorage for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        (**self).remove(key)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }
}
