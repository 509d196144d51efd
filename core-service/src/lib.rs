//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (streaming fetch,
//! blob storage) into the media cache. Desktop apps typically enable the
//! `desktop-shims` feature, which lets [`CoreConfig`] fall back to the
//! adapters from `bridge-desktop` when a bridge is not injected.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_cache::{
    CacheConfig, CacheKey, CacheOrchestrator, DownloadProgress, LoadResult, LoadTask,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    event_bus: Arc<EventBus>,
    orchestrator: CacheOrchestrator,
}

impl CoreService {
    /// Create a new service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let cache_config = CacheConfig::new().with_container_name(config.container_name.clone());

        let orchestrator = CacheOrchestrator::new(
            cache_config,
            Arc::clone(&config.blob_store),
            Arc::clone(&config.streaming_fetcher),
        )?
        .with_event_bus(Arc::clone(&event_bus));

        info!(
            data_dir = ?config.data_dir,
            database = %config.database_name,
            container = %config.container_name,
            backend = ?config.storage_backend,
            "Core service created"
        );

        Ok(Self {
            config: Arc::new(config),
            event_bus,
            orchestrator,
        })
    }

    /// Open the blob store ahead of the first load.
    pub async fn initialize(&self) -> Result<()> {
        self.orchestrator.initialize().await?;
        Ok(())
    }

    /// Load `key`, downloading from `url` on a miss.
    pub async fn load(&self, key: &CacheKey, url: &str) -> LoadResult {
        self.orchestrator.load(key, url).await
    }

    /// Load `key` and report download progress through `on_progress`.
    pub async fn load_with_progress<F>(&self, key: &CacheKey, url: &str, on_progress: F) -> LoadResult
    where
        F: FnMut(DownloadProgress) + Send,
    {
        self.orchestrator
            .load_with_progress(key, url, on_progress)
            .await
    }

    /// Run a load in the background.
    pub fn spawn_load(&self, key: CacheKey, url: impl Into<String>) -> LoadTask {
        self.orchestrator.spawn_load(key, url)
    }

    pub async fn is_cached(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.orchestrator.is_cached(key).await?)
    }

    /// Subscribe to cache events.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn orchestrator(&self) -> &CacheOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the default SQLite store under `data_dir` and the reqwest fetcher.
/// Must be called from within a Tokio runtime.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_cache::{CacheKey, SAMPLE_VIDEO_URL};
///
/// let core = core_service::bootstrap_desktop("/tmp/media-cache")?;
/// let media = core.load(&CacheKey::default(), SAMPLE_VIDEO_URL).await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(data_dir: impl Into<std::path::PathBuf>) -> Result<CoreService> {
    let config = CoreConfig::builder()
        .data_dir(data_dir.into())
        .build()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    CoreService::new(config)
}
