use std::{collections::HashMap, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::{fs, sync::RwLock};

use crate::errors::StoreError;

/// JSON file-backed key-value engine.
///
/// Keeps a `HashMap<String, Value>` in memory and mirrors the whole map to a
/// single JSON file on every mutation. Reads are served from memory only; the
/// file is read back once, at `open`. Intended for small state where a
/// database is overkill.
pub struct Engine {
    inner: RwLock<HashMap<String, Value>>,
    file_path: PathBuf,
}

impl Engine {
    /// Open the engine from a path. A missing or unparsable file yields an
    /// empty map; the file itself is only written by mutations.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Arc<Self> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, Value> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };

        Arc::new(Self { inner: RwLock::new(map), file_path })
    }

    /// Rewrite the persisted file from the given map. Callers hold the write
    /// lock for the whole mutate-then-persist step.
    async fn persist(&self, map: &HashMap<String, Value>) -> Result<(), StoreError> {
        let data = serde_json::to_vec(map)?;
        fs::write(&self.file_path, data).await?;
        Ok(())
    }

    /// Insert or overwrite a value under `key` and persist.
    ///
    /// Serialization happens before the lock, so an unserializable value
    /// leaves the map untouched. A persistence failure is returned after the
    /// map was already updated; the caller sees memory ahead of disk until
    /// the next successful mutation.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut map = self.inner.write().await;
        map.insert(key.to_owned(), value);
        self.persist(&map).await
    }

    /// Look up `key` and deserialize the stored payload into `T`.
    /// Fails with `NotFound` for absent keys and `Serialization` when the
    /// stored payload does not fit the requested shape.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let map = self.inner.read().await;
        let value = map.get(key).ok_or(StoreError::NotFound)?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Remove `key` if present and persist. Deleting an absent key is a
    /// no-op on the map but still rewrites the file.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.remove(key);
        self.persist(&map).await
    }

    /// Drop every entry and persist the empty map.
    pub async fn delete_all(&self) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.clear();
        self.persist(&map).await
    }
}
