//! Durable Blob Storage Abstraction
//!
//! Provides a platform-agnostic keyed binary store used to persist whole media
//! objects across process restarts.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Durable key-to-blob store trait
///
/// Abstracts the on-device storage facility:
/// - Desktop: SQLite table or one file per key
/// - iOS/Android: app sandbox files or an embedded database
/// - Web: IndexedDB object store, OPFS file handles
///
/// # Contract
///
/// - `get` on a missing key returns `Ok(None)`, never an error.
/// - `put` replaces the entry wholesale. Readers observe either the previous
///   entry, no entry, or the complete new entry; never a partial write.
/// - A failed `put` leaves no malformed entry behind.
/// - Initialization is idempotent and may happen lazily on first access.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::BlobStore;
///
/// async fn remember(store: &dyn BlobStore, data: Bytes) -> Result<()> {
///     if !store.exists("mainVideo").await? {
///         store.put("mainVideo", data).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Open the store and create its named container if needed.
    ///
    /// Safe to call any number of times. Implementations that initialize
    /// lazily may leave this as a no-op.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Fetch the blob stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `data` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Check whether an entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Store {}

        #[async_trait]
        impl BlobStore for Store {
            async fn get(&self, key: &str) -> Result<Option<Bytes>>;
            async fn put(&self, key: &str, data: Bytes) -> Result<()>;
        }
    }

    #[tokio::test]
    async fn test_exists_defaults_to_get() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .withf(|key| key.to_string() == "present")
            .returning(|_| Ok(Some(Bytes::from_static(b"data"))));
        store
            .expect_get()
            .withf(|key| key.to_string() == "absent")
            .returning(|_| Ok(None));

        assert!(store.exists("present").await.unwrap());
        assert!(!store.exists("absent").await.unwrap());
    }

    #[tokio::test]
    async fn test_initialize_defaults_to_noop() {
        let store = MockStore::new();
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
    }
}
