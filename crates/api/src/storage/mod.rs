//! Blob storage for inspection photos.
//!
//! Only the returned URL is persisted. [`LocalDiskStorage`] writes under a
//! configured directory which `main` serves at `/uploads`; other backends
//! plug in behind [`ObjectStorage`].

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StorageError>;
}

/// Stores objects as files below `root`.
pub struct LocalDiskStorage {
    root: PathBuf,
    base_url: String,
}

/// URL path under which [`LocalDiskStorage`] objects are served.
pub const UPLOADS_MOUNT: &str = "/uploads";

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: format!("{}{UPLOADS_MOUNT}", public_base_url.trim_end_matches('/')),
        }
    }

    /// Resolve `key` below the root, refusing absolute paths and `..`.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(key, size = bytes.len(), "Stored object");
        Ok(format!("{}/{key}", self.base_url))
    }
}

/// Content-addressed key for an inspection photo.
pub fn photo_key(inspection_id: tripcheck_core::types::DbId, bytes: &[u8], ext: &str) -> String {
    let digest = tripcheck_core::hashing::sha256_hex(bytes);
    format!("inspections/{inspection_id}/{digest}.{ext}")
}
