//! Key-value persistence gateway.
//!
//! The engine treats persistence as an opaque async string store: it
//! serializes its own state and round-trips it through `get`/`set`.
//! [`FileStore`] keeps one `{key}.json` file per key with atomic writes
//! (temp file + fsync + rename) so a crash mid-write never corrupts the
//! last good snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;

/// Opaque asynchronous string store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`. Last write wins.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Filesystem-backed store: one JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDirFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Write to a temp file in the same directory, fsync, then rename.
    fn write_atomic(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        let tmp_path = self.dir.join(format!(".{key}.tmp"));

        std::fs::write(&tmp_path, value.as_bytes()).map_err(|source| {
            StoreError::WriteFailed {
                path: tmp_path.clone(),
                source,
            }
        })?;
        if let Ok(file) = std::fs::File::open(&tmp_path) {
            let _ = file.sync_all();
        }
        std::fs::rename(&tmp_path, &path).map_err(|source| StoreError::WriteFailed {
            path,
            source,
        })
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::ReadFailed { path, source }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.write_atomic(key, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("state").await.unwrap(), None);
        store.set("state", "{}".to_string()).await.unwrap();
        assert_eq!(store.get("state").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert_eq!(store.get("state").await.unwrap(), None);
        store.set("state", r#"{"a":1}"#.to_string()).await.unwrap();
        assert_eq!(
            store.get("state").await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );

        // Overwrite wins.
        store.set("state", r#"{"a":2}"#.to_string()).await.unwrap();
        assert_eq!(
            store.get("state").await.unwrap().as_deref(),
            Some(r#"{"a":2}"#)
        );
    }

    #[tokio::test]
    async fn file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.set("state", "x".to_string()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["state.json"]);
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set("state", "persisted".to_string()).await.unwrap();
        }
        let store = FileStore::new(dir.path()).unwrap();
        assert_eq!(
            store.get("state").await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
