use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {} is not a JSON list of identifiers: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A set of show identifiers (listening history, favorites).
///
/// `list` returns identifiers in the order they were first added;
/// adding an identifier that is already present is a no-op.
pub trait ShowStore: Send + Sync {
    fn has(&self, identifier: &str) -> bool;
    fn add(&self, identifier: &str) -> Result<()>;
    fn remove(&self, identifier: &str) -> Result<()>;
    fn list(&self) -> Vec<String>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShowStore for MemoryStore {
    fn has(&self, identifier: &str) -> bool {
        let ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.iter().any(|id| id == identifier)
    }

    fn add(&self, identifier: &str) -> Result<()> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.iter().any(|id| id == identifier) {
            ids.push(identifier.to_string());
        }
        Ok(())
    }

    fn remove(&self, identifier: &str) -> Result<()> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.retain(|id| id != identifier);
        Ok(())
    }

    fn list(&self) -> Vec<String> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Store persisted as a JSON array, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    ids: Mutex<Vec<String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let ids = if path.exists() {
            let contents = std::fs::read(path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_slice::<Vec<String>>(&contents).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            log::debug!("No store at {}, starting empty", path.display());
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            ids: Mutex::new(ids),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, ids: &[String]) -> Result<()> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(ids).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }

    /// Apply `change` and write the file; memory is left untouched if the write fails.
    fn update(&self, change: impl FnOnce(&mut Vec<String>)) -> Result<()> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = ids.clone();
        change(&mut next);
        if next == *ids {
            return Ok(());
        }
        self.persist(&next)?;
        *ids = next;
        Ok(())
    }
}

impl ShowStore for JsonFileStore {
    fn has(&self, identifier: &str) -> bool {
        let ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.iter().any(|id| id == identifier)
    }

    fn add(&self, identifier: &str) -> Result<()> {
        self.update(|ids| {
            if !ids.iter().any(|id| id == identifier) {
                ids.push(identifier.to_string());
            }
        })
    }

    fn remove(&self, identifier: &str) -> Result<()> {
        self.update(|ids| ids.retain(|id| id != identifier))
    }

    fn list(&self) -> Vec<String> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Default location of a named store (`history`, `favorites`) in the XDG data dir.
pub fn default_store_path(name: &str) -> PathBuf {
    let file = format!("{name}.json");
    match ProjectDirs::from("", "", crate::APP_NAME) {
        Some(dirs) => dirs.data_dir().join(file),
        // Fallback: current directory
        None => PathBuf::from(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn ShowStore) {
        assert!(store.list().is_empty());
        store.add("gd77-05-08").unwrap();
        store.add("gd72-08-27").unwrap();
        store.add("gd77-05-08").unwrap();
        assert!(store.has("gd77-05-08"));
        assert_eq!(store.list(), vec!["gd77-05-08", "gd72-08-27"]);

        store.remove("gd77-05-08").unwrap();
        assert!(!store.has("gd77-05-08"));
        store.remove("never-added").unwrap();
        assert_eq!(store.list(), vec!["gd72-08-27"]);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_json_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(&dir.path().join("favorites.json")).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_json_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.add("gd90-03-29").unwrap();
            store.add("gd69-02-27").unwrap();
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.list(), vec!["gd90-03-29", "gd69-02-27"]);
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path).unwrap_err(),
            StoreError::Json { .. }
        ));
    }

    #[test]
    fn test_default_store_path() {
        let path = default_store_path("favorites");
        assert!(path.ends_with("favorites.json"));
    }
}
