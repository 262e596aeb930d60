//! Local filesystem storage backend

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;

use crate::{Error, Result};

use super::StorageBackend;

/// Local filesystem storage
pub struct LocalStorage {
    root_path: PathBuf,
}

impl LocalStorage {
    pub fn new(root_path: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root_path.into();
        std::fs::create_dir_all(&root_path)?;
        Ok(Self { root_path })
    }

    fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        if key.split('/').any(|part| part == "..") {
            return Err(Error::storage(format!("invalid storage key: {}", key)));
        }
        Ok(self.root_path.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.resolve_path(key)?;
        let data = fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.resolve_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write beside the target, then rename over it
        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix_path = self.resolve_path(prefix)?;
        let mut results = Vec::new();

        if !fs::try_exists(&prefix_path).await? {
            return Ok(results);
        }

        let mut entries = fs::read_dir(&prefix_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Ok(relative) = path.strip_prefix(&self.root_path) {
                if let Some(s) = relative.to_str() {
                    results.push(s.replace(std::path::MAIN_SEPARATOR, "/"));
                }
            }
        }

        results.sort();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        let key = "registrations/one.json";
        let data = Bytes::from("hello world");

        storage.put(key, data.clone()).await.unwrap();
        assert!(storage.exists(key).await.unwrap());

        let retrieved = storage.get(key).await.unwrap();
        assert_eq!(retrieved, data);

        let keys = storage.list("registrations").await.unwrap();
        assert_eq!(keys, vec!["registrations/one.json".to_string()]);

        storage.delete(key).await.unwrap();
        assert!(!storage.exists(key).await.unwrap());

        // deleting twice is fine
        storage.delete(key).await.unwrap();
    }

    #[tokio::test]
    async fn put_overwrites_without_leaving_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        storage.put("r/a.json", Bytes::from("v1")).await.unwrap();
        storage.put("r/a.json", Bytes::from("v2")).await.unwrap();

        assert_eq!(storage.get("r/a.json").await.unwrap(), Bytes::from("v2"));
        assert_eq!(storage.list("r").await.unwrap(), vec!["r/a.json".to_string()]);
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        assert!(storage.get("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn listing_missing_prefix_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path()).unwrap();

        assert!(storage.list("nothing-here").await.unwrap().is_empty());
    }
}
