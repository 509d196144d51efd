//! Blob Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::BlobStore,
};
use bytes::Bytes;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, error, instrument};

const CREATE_BLOBS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS blobs (
        container TEXT NOT NULL,
        key TEXT NOT NULL,
        data BLOB NOT NULL,
        PRIMARY KEY (container, key)
    )
"#;

/// SQLite-backed blob store implementation
///
/// The transactional backend:
/// - One row per `(container, key)`
/// - Each `put` is a single upsert inside its own transaction
/// - Connection and schema are set up lazily on first access
pub struct SqliteBlobStore {
    pool: SqlitePool,
    db_path: Option<PathBuf>,
    container: String,
    schema: OnceCell<()>,
}

impl SqliteBlobStore {
    /// Create a store backed by the database file at `db_path`.
    ///
    /// No I/O happens here; the file and the schema are created on first use.
    /// Must be called from within a Tokio runtime, which drives the pool's
    /// maintenance task.
    pub fn new(db_path: PathBuf, container: impl Into<String>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_lazy_with(options);

        debug!(path = ?db_path, "Configured SQLite blob store");

        Ok(Self {
            pool,
            db_path: Some(db_path),
            container: container.into(),
            schema: OnceCell::new(),
        })
    }

    /// Create an in-memory blob store (for testing)
    ///
    /// A single long-lived connection keeps the database alive for the
    /// lifetime of the store.
    pub fn in_memory(container: impl Into<String>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy("sqlite::memory:")
            .map_err(|e| {
                BridgeError::StorageError(format!("Failed to configure in-memory DB: {}", e))
            })?;

        Ok(Self {
            pool,
            db_path: None,
            container: container.into(),
            schema: OnceCell::new(),
        })
    }

    /// Name of the logical container entries are stored under.
    pub fn container(&self) -> &str {
        &self.container
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                if let Some(parent) = self.db_path.as_deref().and_then(|p| p.parent()) {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .map_err(BridgeError::Io)?;
                    }
                }

                sqlx::query(CREATE_BLOBS_TABLE)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        error!(error = %e, "Failed to create blobs table");
                        BridgeError::StorageError(format!("Failed to open blob store: {}", e))
                    })?;

                debug!(container = %self.container, "Initialized blob store schema");
                Ok::<(), BridgeError>(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn initialize(&self) -> Result<()> {
        self.ensure_schema().await
    }

    #[instrument(skip(self), fields(container = %self.container))]
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT data FROM blobs WHERE container = ? AND key = ?")
            .bind(&self.container)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to read blob: {}", e)))?;

        match row {
            Some(row) => {
                let data: Vec<u8> = row.try_get(0).map_err(|e| {
                    BridgeError::StorageError(format!("Failed to decode blob: {}", e))
                })?;
                debug!(size = data.len(), "Read blob");
                Ok(Some(Bytes::from(data)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, data), fields(container = %self.container, size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.ensure_schema().await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO blobs (container, key, data)
            VALUES (?, ?, ?)
            ON CONFLICT(container, key) DO UPDATE SET
                data = excluded.data
            "#,
        )
        .bind(&self.container)
        .bind(key)
        .bind(data.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(|e| BridgeError::StorageError(format!("Failed to write blob: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to commit blob: {}", e)))?;

        debug!("Stored blob");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT 1 FROM blobs WHERE container = ? AND key = ?")
            .bind(&self.container)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::StorageError(format!("Failed to query blob: {}", e)))?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_returns_none() {
        let store = SqliteBlobStore::in_memory("videos").unwrap();
        assert_eq!(store.get("mainVideo").await.unwrap(), None);
        assert!(!store.exists("mainVideo").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = SqliteBlobStore::in_memory("videos").unwrap();
        let data = Bytes::from(vec![7u8; 4096]);

        store.put("mainVideo", data.clone()).await.unwrap();

        assert_eq!(store.get("mainVideo").await.unwrap(), Some(data));
        assert!(store.exists("mainVideo").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites_whole_entry() {
        let store = SqliteBlobStore::in_memory("videos").unwrap();
        store
            .put("mainVideo", Bytes::from_static(b"first version, longer"))
            .await
            .unwrap();
        store
            .put("mainVideo", Bytes::from_static(b"second"))
            .await
            .unwrap();

        assert_eq!(
            store.get("mainVideo").await.unwrap(),
            Some(Bytes::from_static(b"second"))
        );
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = SqliteBlobStore::in_memory("videos").unwrap();
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.container(), "videos");
    }

    #[tokio::test]
    async fn test_entries_persist_across_reopen() {
        let dir = std::env::temp_dir().join(format!("blob-store-{}", uuid::Uuid::new_v4()));
        let db_path = dir.join("VideoDB.sqlite");
        let data = Bytes::from_static(b"persisted video bytes");

        {
            let store = SqliteBlobStore::new(db_path.clone(), "videos").unwrap();
            store.put("mainVideo", data.clone()).await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteBlobStore::new(db_path, "videos").unwrap();
        assert_eq!(reopened.get("mainVideo").await.unwrap(), Some(data));
        reopened.pool.close().await;

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_containers_are_isolated() {
        let dir = std::env::temp_dir().join(format!("blob-store-{}", uuid::Uuid::new_v4()));
        let db_path = dir.join("VideoDB.sqlite");

        let videos = SqliteBlobStore::new(db_path.clone(), "videos").unwrap();
        let posters = SqliteBlobStore::new(db_path, "posters").unwrap();

        videos
            .put("mainVideo", Bytes::from_static(b"video"))
            .await
            .unwrap();

        assert_eq!(posters.get("mainVideo").await.unwrap(), None);

        videos.pool.close().await;
        posters.pool.close().await;
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
