//! File-backed metadata store for native platforms.

use super::{MetadataStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Stores the shared record as a single JSON object on disk.
///
/// Values are cached in memory and the whole file is rewritten on every
/// change, so readers in other processes always see a complete record.
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create) the store at `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let values = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|e| {
                StoreError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&json).map_err(|e| {
                StoreError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Open the store in the default location.
    ///
    /// On Unix: `~/.local/share/doodlepost/shared.json`
    /// On Windows: `%LOCALAPPDATA%\doodlepost\shared.json`
    pub fn default_location() -> StoreResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StoreError::Io("Could not determine home directory".to_string()))?;
        Self::open(base.join("doodlepost").join("shared.json"))
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            StoreError::Io(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Io(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    /// Apply `change` and persist it. The cache only changes once the file
    /// has been written.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> StoreResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        let mut updated = values.clone();
        change(&mut updated);
        self.persist(&updated)?;
        *values = updated;
        Ok(())
    }
}

impl MetadataStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn set_many(&self, entries: &[(&'static str, String)]) -> StoreResult<()> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert((*key).to_string(), value.clone());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("shared.json");

        let store = FileStore::open(path.clone()).unwrap();
        store.set("senderName", "Ada").unwrap();
        store
            .set_many(&[("senderInitials", "AD".to_string()), ("senderColor", "#FF0000".to_string())])
            .unwrap();
        drop(store);

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(reopened.get("senderName").unwrap().as_deref(), Some("Ada"));
        assert_eq!(reopened.get("senderColor").unwrap().as_deref(), Some("#FF0000"));
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.json");

        let store = FileStore::open(path.clone()).unwrap();
        store.set("doodleId", "42").unwrap();
        store.remove("doodleId").unwrap();

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(reopened.get("doodleId").unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_cache_untouched() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");
        let store = FileStore::open(gone.join("shared.json")).unwrap();
        store.set("senderName", "Grace").unwrap();
        fs::remove_dir_all(&gone).unwrap();

        assert!(matches!(store.set("senderName", "Ada"), Err(StoreError::Io(_))));
        assert_eq!(store.get("senderName").unwrap().as_deref(), Some("Grace"));
        assert!(store.remove("senderName").is_err());
        assert_eq!(store.get("senderName").unwrap().as_deref(), Some("Grace"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(path),
            Err(StoreError::Serialization(_))
        ));
    }
}
