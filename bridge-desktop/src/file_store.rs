//! Blob Storage using one file per key

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::BlobStore,
};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const BLOB_EXTENSION: &str = "blob";

/// File-backed blob store implementation
///
/// Layout: `<root>/<container>/<hex(key)>.blob`. Keys are hex encoded so any
/// string is a valid file name.
///
/// Writes go to a uniquely named temporary file in the same directory, are
/// synced, and then renamed over the destination. A reader sees the old file
/// or the new one, never a half-written file.
pub struct FileBlobStore {
    container_dir: PathBuf,
    container: String,
}

impl FileBlobStore {
    /// Create a store rooted at `root`, keeping entries under `root/container`.
    pub fn new(root: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        let container = container.into();
        let container_dir = root.into().join(&container);
        Self {
            container_dir,
            container,
        }
    }

    /// Create a store under the platform data directory.
    pub fn in_data_dir(app_name: &str, container: impl Into<String>) -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(app_name);
        Self::new(root, container)
    }

    /// Name of the logical container entries are stored under.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Directory holding this container's files.
    pub fn directory(&self) -> &Path {
        &self.container_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.container_dir
            .join(format!("{}.{}", hex::encode(key.as_bytes()), BLOB_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.container_dir.join(format!(
            ".{}.tmp.{}",
            hex::encode(key.as_bytes()),
            Uuid::new_v4()
        ))
    }

    async fn write_temp(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Flush the directory entry so a completed rename survives a crash.
    #[cfg(unix)]
    async fn sync_directory(dir: &Path) -> std::io::Result<()> {
        fs::File::open(dir).await?.sync_all().await
    }

    #[cfg(not(unix))]
    async fn sync_directory(_dir: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.container_dir)
            .await
            .map_err(BridgeError::Io)?;
        debug!(path = ?self.container_dir, "Initialized blob directory");
        Ok(())
    }

    #[instrument(skip(self), fields(container = %self.container))]
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match fs::read(self.entry_path(key)).await {
            Ok(data) => {
                debug!(size = data.len(), "Read blob file");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::StorageError(format!(
                "Failed to read blob file: {}",
                e
            ))),
        }
    }

    #[instrument(skip(self, data), fields(container = %self.container, size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.initialize().await?;

        let target = self.entry_path(key);
        let temp = self.temp_path(key);

        if let Err(e) = Self::write_temp(&temp, &data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(BridgeError::StorageError(format!(
                "Failed to write blob file: {}",
                e
            )));
        }

        if let Err(e) = fs::rename(&temp, &target).await {
            warn!(error = %e, "Failed to move blob into place");
            let _ = fs::remove_file(&temp).await;
            return Err(BridgeError::StorageError(format!(
                "Failed to commit blob file: {}",
                e
            )));
        }

        if let Err(e) = Self::sync_directory(&self.container_dir).await {
            warn!(error = %e, "Failed to sync blob directory");
            return Err(BridgeError::StorageError(format!(
                "Failed to sync blob directory: {}",
                e
            )));
        }

        debug!("Stored blob file");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        fs::try_exists(self.entry_path(key))
            .await
            .map_err(BridgeError::Io)
    }
}
