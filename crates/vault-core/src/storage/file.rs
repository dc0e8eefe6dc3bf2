//! File-backed storage
//!
//! Keeps all entries in a single JSON file in the user's data directory.
//! Writes go through a temp file + rename so a crashed save never leaves a
//! half-written file behind.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::VaultStorage;
use crate::crypto::encoding;
use crate::error::{Result, VaultError};

const DATA_FILE: &str = "vault.json";
const FILE_VERSION: u32 = 1;

/// On-disk format: entry values are base64 since the file itself is JSON
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    entries: HashMap<String, String>,
}

/// File storage backend
pub struct FileStorage {
    dir: PathBuf,
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl FileStorage {
    /// Create a file storage rooted at the platform data directory
    pub fn new() -> Result<Self> {
        let dir = ProjectDirs::from("com", "passvault", "passvault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::Storage("could not determine data directory".to_string())
            })?;
        Self::with_dir(dir)
    }

    /// Create with a custom storage directory (for testing)
    pub fn with_dir(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let entries = Self::read_entries(&dir.join(DATA_FILE))?;

        debug!("file storage initialized at {:?}", dir);

        Ok(Self {
            dir,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn data_file(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn read_entries(path: &Path) -> Result<HashMap<String, Vec<u8>>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let file: StorageFile = serde_json::from_str(&contents)?;

        let mut entries = HashMap::with_capacity(file.entries.len());
        for (key, value) in file.entries {
            let bytes = encoding::from_base64(&value).map_err(|e| {
                VaultError::Storage(format!("corrupt entry `{}` in storage file: {}", key, e))
            })?;
            entries.insert(key, bytes);
        }
        Ok(entries)
    }

    async fn persist(&self) -> Result<()> {
        let snapshot: HashMap<String, String> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .map(|(key, value)| (key.clone(), encoding::to_base64(value)))
                .collect()
        };

        let file = StorageFile {
            version: FILE_VERSION,
            entries: snapshot,
        };
        let contents = serde_json::to_string_pretty(&file)?;

        // Atomic from a reader's perspective: write to a temp file, then rename
        let path = self.data_file();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("persisted {} entries to {:?}", file.entries.len(), path);
        Ok(())
    }
}

#[async_trait]
impl VaultStorage for FileStorage {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        self.persist().await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.entries.write().await.remove(key).is_some() {
            self.persist().await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        self.persist().await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf()).unwrap();

        storage.store("key", b"value").await.unwrap();

        assert_eq!(storage.retrieve("key").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(storage.retrieve("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf()).unwrap();

        storage.store("key", b"value").await.unwrap();
        storage.delete("key").await.unwrap();

        assert!(!storage.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        {
            let storage = FileStorage::with_dir(temp_dir.path().to_path_buf()).unwrap();
            storage.store("durable", &[0, 1, 2, 255]).await.unwrap();
        }

        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(
            storage.retrieve("durable").await.unwrap(),
            Some(vec![0, 1, 2, 255])
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf()).unwrap();

        storage.store("a", b"1").await.unwrap();
        storage.store("b", b"2").await.unwrap();
        storage.clear().await.unwrap();

        assert!(!storage.exists("a").await.unwrap());
        assert!(!storage.exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf()).unwrap();

        storage.store("key", b"value").await.unwrap();

        assert!(temp_dir.path().join(DATA_FILE).exists());
        assert!(!temp_dir.path().join("vault.tmp").exists());
    }
}
