//! # Core Configuration Module
//!
//! Provides configuration management for the media cache core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the cache needs. It enforces
//! fail-fast validation so a missing bridge is reported at startup rather than
//! on the first load.
//!
//! ## Required Dependencies
//!
//! - `BlobStore` - Durable storage for cached media
//! - `StreamingFetcher` - Chunked network downloads
//!
//! When the `desktop-shims` feature is enabled, desktop defaults are injected
//! automatically if not provided: `SqliteBlobStore` (or `FileBlobStore`, see
//! [`StorageBackend`]) and `ReqwestStreamingFetcher`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, StorageBackend};
//!
//! let config = CoreConfig::builder()
//!     .data_dir("/path/to/app-data")
//!     .storage_backend(StorageBackend::FileSystem)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! Without `desktop-shims` the builder refuses to guess:
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let err = CoreConfig::builder()
//!     .data_dir("/path/to/app-data")
//!     .build()
//!     .unwrap_err();
//! assert!(err.to_string().contains("BlobStore"));
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{BlobStore, StreamingFetcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default database name; the SQLite file is `<data_dir>/<name>.sqlite`.
pub const DEFAULT_DATABASE_NAME: &str = "VideoDB";

/// Default container (object store) name.
pub const DEFAULT_CONTAINER_NAME: &str = "videos";

/// Which desktop `BlobStore` to inject when none is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// One row per key in a SQLite table, written transactionally.
    #[default]
    Sqlite,
    /// One file per key, written to a temporary file and renamed into place.
    FileSystem,
}

/// Core configuration for the media cache core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory holding the database file or blob directory
    pub data_dir: PathBuf,

    /// Logical database name
    pub database_name: String,

    /// Container (object store) holding cached media
    pub container_name: String,

    /// Backend used for the default blob store
    pub storage_backend: StorageBackend,

    /// Buffer size of the event bus channel
    pub event_buffer_size: usize,

    /// Durable blob storage
    pub blob_store: Arc<dyn BlobStore>,

    /// Network streaming capability
    pub streaming_fetcher: Arc<dyn StreamingFetcher>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field("database_name", &self.database_name)
            .field("container_name", &self.container_name)
            .field("storage_backend", &self.storage_backend)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("blob_store", &"BlobStore { ... }")
            .field("streaming_fetcher", &"StreamingFetcher { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        database_path(&self.data_dir, &self.database_name)
    }

    /// Root directory of the file-per-key blob store.
    pub fn blob_root(&self) -> PathBuf {
        blob_root(&self.data_dir, &self.database_name)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Data directory is not empty
    /// - Database and container names are non-empty plain names
    /// - Event buffer size is reasonable (> 0 and <= 65536)
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("Data directory cannot be empty".to_string()));
        }

        validate_name("Database name", &self.database_name)?;
        validate_name("Container name", &self.container_name)?;

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > 65_536 {
            return Err(Error::Config(
                "Event buffer size exceeds maximum of 65536".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_name(label: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config(format!("{} cannot be empty", label)));
    }
    if name.contains(&['/', '\\'][..]) || name == "." || name == ".." {
        return Err(Error::Config(format!(
            "{} must be a plain name without path separators: {:?}",
            label, name
        )));
    }
    Ok(())
}

fn database_path(data_dir: &Path, database_name: &str) -> PathBuf {
    data_dir.join(format!("{}.sqlite", database_name))
}

fn blob_root(data_dir: &Path, database_name: &str) -> PathBuf {
    data_dir.join(database_name)
}

#[cfg(not(feature = "desktop-shims"))]
fn blob_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "BlobStore".to_string(),
        message: "BlobStore implementation is required to persist cached media. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteBlobStore. \
                 Mobile: inject app-sandbox file or database storage. \
                 Web: inject an IndexedDB-backed store."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn streaming_fetcher_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "StreamingFetcher".to_string(),
        message: "StreamingFetcher implementation is required to download media. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestStreamingFetcher. \
                 Mobile: inject URLSession/OkHttp streaming. \
                 Web: inject a fetch()-based reader."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_blob_store(
    backend: StorageBackend,
    data_dir: &Path,
    database_name: &str,
    container_name: &str,
) -> Result<Arc<dyn BlobStore>> {
    use bridge_desktop::{FileBlobStore, SqliteBlobStore};

    let store: Arc<dyn BlobStore> = match backend {
        StorageBackend::Sqlite => Arc::new(SqliteBlobStore::new(
            database_path(data_dir, database_name),
            container_name,
        )?),
        StorageBackend::FileSystem => Arc::new(FileBlobStore::new(
            blob_root(data_dir, database_name),
            container_name,
        )),
    };
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_blob_store(
    _backend: StorageBackend,
    _data_dir: &Path,
    _database_name: &str,
    _container_name: &str,
) -> Result<Arc<dyn BlobStore>> {
    Err(blob_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_streaming_fetcher() -> Result<Arc<dyn StreamingFetcher>> {
    use bridge_desktop::ReqwestStreamingFetcher;

    let fetcher: Arc<dyn StreamingFetcher> = Arc::new(ReqwestStreamingFetcher::new()?);
    Ok(fetcher)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_streaming_fetcher() -> Result<Arc<dyn StreamingFetcher>> {
    Err(streaming_fetcher_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    data_dir: Option<PathBuf>,
    database_name: Option<String>,
    container_name: Option<String>,
    storage_backend: StorageBackend,
    event_buffer_size: Option<usize>,
    blob_store: Option<Arc<dyn BlobStore>>,
    streaming_fetcher: Option<Arc<dyn StreamingFetcher>>,
}

impl CoreConfigBuilder {
    /// Sets the data directory (required).
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .data_dir("/path/to/app-data");
    /// ```
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the database name.
    ///
    /// Default: `"VideoDB"`
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Sets the container name.
    ///
    /// Default: `"videos"`
    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    /// Selects the backend for the default blob store.
    ///
    /// Ignored when a store is injected with [`blob_store`](Self::blob_store).
    pub fn storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage_backend = backend;
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 256
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the blob store implementation.
    ///
    /// If not provided, a desktop default is used when the `desktop-shims`
    /// feature is enabled.
    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    /// Sets the streaming fetcher implementation.
    ///
    /// If not provided, the reqwest-based fetcher is used when the
    /// `desktop-shims` feature is enabled.
    pub fn streaming_fetcher(mut self, fetcher: Arc<dyn StreamingFetcher>) -> Self {
        self.streaming_fetcher = Some(fetcher);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The data directory is missing
    /// - A bridge is missing and no desktop default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let data_dir = self.data_dir.ok_or_else(|| {
            Error::Config("Data directory is required. Use .data_dir() to set it.".to_string())
        })?;

        let database_name = self
            .database_name
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        let container_name = self
            .container_name
            .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string());

        // Names end up in file paths, so check them before building defaults
        validate_name("Database name", &database_name)?;
        validate_name("Container name", &container_name)?;

        let blob_store = match self.blob_store {
            Some(store) => store,
            None => provide_default_blob_store(
                self.storage_backend,
                &data_dir,
                &database_name,
                &container_name,
            )?,
        };

        let streaming_fetcher = match self.streaming_fetcher {
            Some(fetcher) => fetcher,
            None => provide_default_streaming_fetcher()?,
        };

        let config = CoreConfig {
            data_dir,
            database_name,
            container_name,
            storage_backend: self.storage_backend,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            blob_store,
            streaming_fetcher,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::ByteStream;
    use bytes::Bytes;

    struct MemoryStore;

    #[async_trait]
    impl BlobStore for MemoryStore {
        async fn get(&self, _key: &str) -> BridgeResult<Option<Bytes>> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _data: Bytes) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct EmptyFetcher;

    #[async_trait]
    impl StreamingFetcher for EmptyFetcher {
        async fn open(&self, _url: &str) -> BridgeResult<ByteStream> {
            Ok(ByteStream::from_chunks(Some(0), Vec::new()))
        }
    }

    fn builder_with_bridges() -> CoreConfigBuilder {
        CoreConfig::builder()
            .data_dir("/data/media")
            .blob_store(Arc::new(MemoryStore))
            .streaming_fetcher(Arc::new(EmptyFetcher))
    }

    #[test]
    fn test_builder_requires_data_dir() {
        let result = CoreConfig::builder()
            .blob_store(Arc::new(MemoryStore))
            .streaming_fetcher(Arc::new(EmptyFetcher))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Data directory is required"));
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder_with_bridges().build().unwrap();

        assert_eq!(config.database_name, "VideoDB");
        assert_eq!(config.container_name, "videos");
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/data/media/VideoDB.sqlite")
        );
        assert_eq!(config.blob_root(), PathBuf::from("/data/media/VideoDB"));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = builder_with_bridges()
            .database_name("Clips")
            .container_name("trailers")
            .storage_backend(StorageBackend::FileSystem)
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert_eq!(config.database_name, "Clips");
        assert_eq!(config.container_name, "trailers");
        assert_eq!(config.storage_backend, StorageBackend::FileSystem);
        assert_eq!(config.event_buffer_size, 16);
    }

    #[test]
    fn test_validate_rejects_zero_event_buffer() {
        let result = builder_with_bridges().event_buffer_size(0).build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be greater than 0"));
    }

    #[test]
    fn test_validate_rejects_path_like_names() {
        let result = builder_with_bridges().container_name("../videos").build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = builder_with_bridges().database_name("").build();
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = builder_with_bridges().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("BlobStore { ... }"));
        assert!(debug.contains("VideoDB"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_blob_store() {
        let result = CoreConfig::builder()
            .data_dir("/data/media")
            .streaming_fetcher(Arc::new(EmptyFetcher))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "BlobStore")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_streaming_fetcher() {
        let result = CoreConfig::builder()
            .data_dir("/data/media")
            .blob_store(Arc::new(MemoryStore))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("StreamingFetcher"));
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));

        let config = CoreConfig::builder()
            .data_dir(&base)
            .storage_backend(StorageBackend::FileSystem)
            .build()
            .expect("desktop defaults should succeed");

        config
            .blob_store
            .put("mainVideo", Bytes::from_static(b"video"))
            .await
            .unwrap();
        assert!(config.blob_root().join("videos").exists());

        drop(config);
        let _ = tokio::fs::remove_dir_all(&base).await;
    }
}
