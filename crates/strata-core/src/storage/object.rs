//! File-backed object store
//!
//! Cold payloads live as JSON files under a root directory. Keys are
//! path-like strings; a `.json` extension is implied, absolute keys are
//! respected literally. Writes go through a temp file and an atomic rename
//! so readers never observe a partial payload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{MemoryError, Result};
use crate::storage::ObjectStore;

/// JSON-file object store rooted at a directory.
pub struct FileObjectStore {
    root: Arc<PathBuf>,
}

impl FileObjectStore {
    /// Create the store, ensuring the root directory exists.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root: Arc::new(root) })
    }

    fn resolve_path(root: &Path, key: &str) -> PathBuf {
        let relative = if key.ends_with(".json") {
            PathBuf::from(key)
        } else {
            PathBuf::from(format!("{key}.json"))
        };
        if relative.is_absolute() {
            relative
        } else {
            root.join(relative)
        }
    }

    fn write_atomic(path: &Path, payload: &Value) -> Result<String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(payload)?)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn run_blocking<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<PathBuf>) -> Result<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || task(root))
            .await
            .map_err(|e| MemoryError::Backend(format!("object store task failed: {e}")))?
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn put(&self, key: &str, payload: &Value) -> Result<String> {
        let key = key.to_string();
        let payload = payload.clone();
        self.run_blocking(move |root| {
            let path = Self::resolve_path(&root, &key);
            Self::write_atomic(&path, &payload)
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = key.to_string();
        self.run_blocking(move |root| {
            let path = Self::resolve_path(&root, &key);
            if !path.exists() {
                return Ok(None);
            }
            let bytes = std::fs::read(&path)?;
            Ok(Some(serde_json::from_slice(&bytes)?))
        })
        .await
    }

    async fn append(&self, key: &str, payload: &Value) -> Result<String> {
        let key = key.to_string();
        let payload = payload.clone();
        self.run_blocking(move |root| {
            let path = Self::resolve_path(&root, &key);
            // Corrupt or non-list files restart as an empty list
            let mut entries: Vec<Value> = if path.exists() {
                std::fs::read(&path)
                    .ok()
                    .and_then(|bytes| serde_json::from_slice(&bytes).ok())
                    .and_then(|value: Value| match value {
                        Value::Array(entries) => Some(entries),
                        _ => None,
                    })
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            entries.push(payload);
            Self::write_atomic(&path, &Value::Array(entries))
        })
        .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
