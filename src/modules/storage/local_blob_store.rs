//! Local filesystem blob store
//!
//! Payloads live as flat files `<uploads_dir>/<key>`. Keys are generated here
//! (random UUID plus the original extension) and never derived from the
//! human-readable document name.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};

/// Longest extension carried over from the suggested name
const MAX_EXTENSION_LEN: usize = 16;

/// Persists document payloads under generated keys
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `content` under a fresh key and return that key
    async fn put(&self, content: &[u8], suggested_name: &str) -> Result<String>;

    /// Read the payload stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the payload stored under `key`
    async fn delete(&self, key: &str) -> Result<()>;
}

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.uploads_dir.clone(),
        }
    }

    /// Create the uploads directory if it does not exist yet
    pub async fn ensure_root_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Io(format!(
                "Failed to create uploads directory {:?}: {}",
                self.root, e
            ))
        })?;
        info!("Blob store ready at {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    async fn write_atomically(&self, path: &Path, content: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_file_name(format!(
            ".{}.tmp-{}",
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("blob"),
            Uuid::new_v4().simple()
        ));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(content).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, path).await
        }
        .await;

        if written.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        written
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, content: &[u8], suggested_name: &str) -> Result<String> {
        let key = generate_key(suggested_name);
        let path = self.path_for(&key)?;

        self.write_atomically(&path, content)
            .await
            .map_err(|e| AppError::Io(format!("Failed to write blob '{}': {}", key, e)))?;

        debug!("Blob written: key={}, size={}", key, content.len());
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;

        fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound(format!("Blob '{}' not found", key)),
            _ => AppError::Io(format!("Failed to read blob '{}': {}", key, e)),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound(format!("Blob '{}' not found", key)),
            _ => AppError::Io(format!("Failed to delete blob '{}': {}", key, e)),
        })?;

        debug!("Blob deleted: key={}", key);
        Ok(())
    }
}

/// Random key keeping the (sanitized) extension of the suggested name
pub fn generate_key(suggested_name: &str) -> String {
    let id = Uuid::new_v4();

    match extension_of(suggested_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn extension_of(name: &str) -> Option<String> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = file_name.rsplit_once('.')?;

    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}

/// Keys are flat file names: no separators, no traversal
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains("..")
        && !key.contains(['/', '\\', '\0']);

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid blob key '{}'", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalBlobStore {
        let root = std::env::temp_dir().join(format!("docvault-blobs-{}", Uuid::new_v4()));
        LocalBlobStore::new(&StorageConfig { uploads_dir: root })
    }

    async fn file_count(dir: &Path) -> usize {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(_) => return 0,
        };
        let mut count = 0;
        while let Ok(Some(_)) = entries.next_entry().await {
            count += 1;
        }
        count
    }

    #[test]
    fn test_generate_key_keeps_extension() {
        let key = generate_key("report.PDF");
        assert!(key.ends_with(".pdf"));
        assert!(Uuid::parse_str(key.trim_end_matches(".pdf")).is_ok());
    }

    #[test]
    fn test_generate_key_drops_suspicious_extension() {
        assert!(!generate_key("archive.tar/../x").contains('/'));
        assert!(!generate_key(".bashrc").contains('.'));
        assert!(!generate_key("notes").contains('.'));
        assert!(!generate_key("weird.ext with space").contains(' '));
    }

    #[test]
    fn test_generate_key_is_unique_per_call() {
        assert_ne!(generate_key("a.txt"), generate_key("a.txt"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("3f2c.pdf").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("nested/key").is_err());
        assert!(validate_key(".hidden").is_err());
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = temp_store();

        let key = store.put(b"hello world", "greeting.txt").await.unwrap();
        assert!(key.ends_with(".txt"));

        let content = store.get(&key).await.unwrap();
        assert_eq!(content, b"hello world");

        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap_err().is_not_found());

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_put_creates_missing_directory() {
        let store = temp_store();
        assert!(!store.root().exists());

        store.put(b"x", "x.bin").await.unwrap();
        assert!(store.root().exists());

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let store = temp_store();

        store.put(b"first", "one.txt").await.unwrap();
        store.put(b"second", "two.txt").await.unwrap();

        assert_eq!(file_count(store.root()).await, 2);

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let store = temp_store();
        store.ensure_root_exists().await.unwrap();

        assert!(store.get("missing.pdf").await.unwrap_err().is_not_found());
        assert!(store.delete("missing.pdf").await.unwrap_err().is_not_found());

        let _ = fs::remove_dir_all(store.root()).await;
    }
}
