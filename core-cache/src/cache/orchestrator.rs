//! Cache orchestrator: check the store, stream on miss, persist, hand out a handle.

use bridge_traits::{BlobStore, StreamingFetcher};
use bytes::BytesMut;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use core_runtime::logging::redact_url;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::config::CacheConfig;
use crate::cache::progress::DownloadProgress;
use crate::cache::state::LoadState;
use crate::error::{CacheError, FailureKind, FailureReason, Result};
use crate::handle::{PlaybackHandle, PlaybackHandleFactory};
use crate::key::{CacheKey, CachedObject};

/// Outcome of a load call. Only produced once the load has finished.
pub type LoadResult = std::result::Result<LoadedMedia, FailureReason>;

type ProgressCallback<'a> = &'a mut (dyn FnMut(DownloadProgress) + Send);

/// Where the returned bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Read from the blob store; no network access happened.
    Cache,
    /// Downloaded and persisted by this call.
    Network,
}

/// Successful load.
#[derive(Debug)]
pub struct LoadedMedia {
    /// Handle to give to the playback surface
    pub handle: PlaybackHandle,
    /// Size of the object in bytes
    pub size: u64,
    pub origin: LoadOrigin,
}

impl LoadedMedia {
    pub fn url(&self) -> &str {
        self.handle.url()
    }
}

/// Loads media through the local cache.
///
/// On a hit the stored object is returned without touching the network. On a
/// miss the remote resource is streamed into memory, reported chunk by chunk,
/// written to the store with a single `put`, and then returned.
///
/// Loads for the same key are not coordinated; concurrent misses each download
/// and the last successful write wins.
#[derive(Clone)]
pub struct CacheOrchestrator {
    config: CacheConfig,
    store: Arc<dyn BlobStore>,
    fetcher: Arc<dyn StreamingFetcher>,
    handles: PlaybackHandleFactory,
    event_bus: Option<Arc<EventBus>>,
}

impl CacheOrchestrator {
    /// Create an orchestrator over the given bridges.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        config: CacheConfig,
        store: Arc<dyn BlobStore>,
        fetcher: Arc<dyn StreamingFetcher>,
    ) -> Result<Self> {
        config.validate().map_err(CacheError::InvalidConfig)?;
        let handles = PlaybackHandleFactory::new(
            config.handle_scheme.clone(),
            config.container_name.clone(),
        );

        Ok(Self {
            config,
            store,
            fetcher,
            handles,
            event_bus: None,
        })
    }

    /// Set event bus for state and progress events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Factory that issued this orchestrator's handles.
    pub fn handles(&self) -> &PlaybackHandleFactory {
        &self.handles
    }

    /// Open the underlying store ahead of the first load.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        self.store.initialize().await.map_err(CacheError::Storage)?;
        info!(container = %self.config.container_name, "Cache initialized");
        Ok(())
    }

    /// Whether an object is stored under `key`.
    pub async fn is_cached(&self, key: &CacheKey) -> Result<bool> {
        self.store
            .exists(key.as_str())
            .await
            .map_err(CacheError::Storage)
    }

    /// Load `key`, downloading from `url` on a miss.
    pub async fn load(&self, key: &CacheKey, url: &str) -> LoadResult {
        self.load_with_progress(key, url, |_| {}).await
    }

    /// Load `key`, calling `on_progress` once per received chunk.
    ///
    /// An empty body with a known size gets a single call at 100%. The
    /// callback is never invoked on a cache hit.
    #[instrument(skip(self, key, url, on_progress), fields(key = %key))]
    pub async fn load_with_progress<F>(
        &self,
        key: &CacheKey,
        url: &str,
        mut on_progress: F,
    ) -> LoadResult
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let (object, origin) = self.resolve_object(key, url, &mut on_progress).await?;
        Ok(self.finish(object, origin))
    }

    /// Run the load on the Tokio runtime.
    ///
    /// Dropping the returned task does not cancel the download; the cache is
    /// still populated, but no handle is created for the abandoned caller.
    pub fn spawn_load(&self, key: CacheKey, url: impl Into<String>) -> LoadTask {
        let url = url.into();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();
        let orchestrator = self.clone();

        let join = tokio::spawn(async move {
            let mut forward = |progress: DownloadProgress| {
                let _ = progress_tx.send(progress);
            };
            let outcome = orchestrator.resolve_object(&key, &url, &mut forward).await;

            if result_tx.is_closed() {
                debug!(key = %key, "Load abandoned by caller, skipping handle");
                return;
            }

            let result = outcome
                .map(|(object, origin)| orchestrator.finish(object, origin))
                .map_err(FailureReason::from);

            // A handle in an undeliverable result is released on drop
            let _ = result_tx.send(result);
        });

        LoadTask {
            progress: progress_rx,
            result: result_rx,
            join,
        }
    }

    fn finish(&self, object: CachedObject, origin: LoadOrigin) -> LoadedMedia {
        let size = object.len() as u64;
        let handle = self.handles.create(object);
        LoadedMedia {
            handle,
            size,
            origin,
        }
    }

    /// Drive the state machine to a terminal state, catching bridge panics.
    async fn resolve_object(
        &self,
        key: &CacheKey,
        url: &str,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(CachedObject, LoadOrigin)> {
        let mut tracker = LoadTracker::new(key.as_str(), self.event_bus.as_deref());

        let outcome = AssertUnwindSafe(self.fetch_object(key, url, on_progress, &mut tracker))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(CacheError::Panicked(panic_message(payload.as_ref()))),
        };

        match result {
            Ok((object, origin)) => {
                tracker.transition(LoadState::Ready)?;
                info!(
                    key = %key,
                    size = object.len(),
                    origin = ?origin,
                    "Media ready"
                );
                Ok((object, origin))
            }
            Err(e) => {
                let kind = e.kind();
                error!(key = %key, kind = %kind, error = %e, "Failed to load media");
                tracker.fail();
                self.emit(CacheEvent::Failed {
                    key: key.to_string(),
                    kind: kind.to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_object(
        &self,
        key: &CacheKey,
        url: &str,
        on_progress: ProgressCallback<'_>,
        tracker: &mut LoadTracker<'_>,
    ) -> Result<(CachedObject, LoadOrigin)> {
        tracker.transition(LoadState::CheckingCache)?;

        let cached = self
            .store
            .get(key.as_str())
            .await
            .map_err(CacheError::Storage)?;

        if let Some(data) = cached {
            tracker.transition(LoadState::CacheHit)?;
            info!(key = %key, size = data.len(), "Serving media from cache");
            self.emit(CacheEvent::CacheHit {
                key: key.to_string(),
                size_bytes: data.len() as u64,
            });
            return Ok((CachedObject::from(data), LoadOrigin::Cache));
        }

        tracker.transition(LoadState::CacheMiss)?;
        let shown_url = redact_url(url);
        info!(key = %key, url = %shown_url, "Cache miss, downloading");

        let mut stream = self
            .fetcher
            .open(url)
            .await
            .map_err(CacheError::from_fetch)?;

        tracker.transition(LoadState::Fetching)?;
        let total = stream.content_length();
        self.emit(CacheEvent::DownloadStarted {
            key: key.to_string(),
            url: shown_url,
            total_bytes: total,
        });

        let capacity = total
            .map(|t| usize::try_from(t).unwrap_or(usize::MAX))
            .unwrap_or(0)
            .min(self.config.preallocate_limit_bytes);
        let mut buffer = BytesMut::with_capacity(capacity);
        let mut progress = DownloadProgress::new(total);
        let mut over_delivery_logged = false;

        while let Some(chunk) = stream.next_chunk().await.map_err(CacheError::from_fetch)? {
            buffer.extend_from_slice(&chunk);
            progress.advance(chunk.len());

            if progress.is_over_delivered() && !over_delivery_logged {
                warn!(
                    key = %key,
                    received = progress.received_bytes,
                    expected = ?total,
                    "Server sent more data than announced"
                );
                over_delivery_logged = true;
            }

            debug!(
                chunk = chunk.len(),
                received = progress.received_bytes,
                percent = ?progress.percent(),
                "Received chunk"
            );
            self.report_progress(key, progress, &mut *on_progress);
        }

        if let Some(expected) = total {
            if progress.received_bytes < expected {
                return Err(CacheError::Truncated {
                    received: progress.received_bytes,
                    expected,
                });
            }
        }

        // An empty body with a known size still completes at 100%
        if progress.received_bytes == 0 && total.is_some() {
            self.report_progress(key, progress, &mut *on_progress);
        }

        tracker.transition(LoadState::Assembling)?;
        let data = buffer.freeze();

        tracker.transition(LoadState::Persisting)?;
        self.store
            .put(key.as_str(), data.clone())
            .await
            .map_err(CacheError::Storage)?;

        info!(key = %key, size = data.len(), "Stored media in cache");
        self.emit(CacheEvent::Persisted {
            key: key.to_string(),
            size_bytes: data.len() as u64,
        });

        Ok((CachedObject::from(data), LoadOrigin::Network))
    }

    fn report_progress(
        &self,
        key: &CacheKey,
        progress: DownloadProgress,
        on_progress: ProgressCallback<'_>,
    ) {
        on_progress(progress);
        self.emit(CacheEvent::Progress {
            key: key.to_string(),
            received_bytes: progress.received_bytes,
            total_bytes: progress.total_bytes,
            percent: progress.percent(),
        });
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Cache(event)).ok();
        }
    }
}

impl std::fmt::Debug for CacheOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator")
            .field("config", &self.config)
            .field("handles", &self.handles)
            .field("has_event_bus", &self.event_bus.is_some())
            .finish()
    }
}

/// A load running in the background.
pub struct LoadTask {
    /// Per-chunk progress; closes when the download ends.
    pub progress: mpsc::UnboundedReceiver<DownloadProgress>,
    result: oneshot::Receiver<LoadResult>,
    join: JoinHandle<()>,
}

impl LoadTask {
    /// Next progress value, or `None` once the download has ended.
    pub async fn next_progress(&mut self) -> Option<DownloadProgress> {
        self.progress.recv().await
    }

    /// Wait for the load to finish.
    pub async fn wait(self) -> LoadResult {
        match self.result.await {
            Ok(result) => result,
            Err(_) => {
                let message = match self.join.await {
                    Err(e) if e.is_panic() => {
                        format!("Load task panicked: {}", panic_message(e.into_panic().as_ref()))
                    }
                    Err(e) => format!("Load task failed: {}", e),
                    Ok(()) => "Load task ended without a result".to_string(),
                };
                Err(FailureReason::new(FailureKind::Unknown, message))
            }
        }
    }
}

impl std::fmt::Debug for LoadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTask")
            .field("finished", &self.join.is_finished())
            .finish()
    }
}

/// Tracks the state of one load and publishes each transition.
struct LoadTracker<'a> {
    key: &'a str,
    state: LoadState,
    event_bus: Option<&'a EventBus>,
}

impl<'a> LoadTracker<'a> {
    fn new(key: &'a str, event_bus: Option<&'a EventBus>) -> Self {
        Self {
            key,
            state: LoadState::Idle,
            event_bus,
        }
    }

    fn transition(&mut self, next: LoadState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CacheError::Internal(format!(
                "Illegal load state transition {} -> {}",
                self.state, next
            )));
        }
        self.apply(next);
        Ok(())
    }

    fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.apply(LoadState::Failed);
        }
    }

    fn apply(&mut self, next: LoadState) {
        debug!(key = self.key, from = %self.state, to = %next, "Load state changed");
        if let Some(bus) = self.event_bus {
            bus.emit(CoreEvent::Cache(CacheEvent::StateChanged {
                key: self.key.to_string(),
                from: self.state.to_string(),
                to: next.to_string(),
            }))
            .ok();
        }
        self.state = next;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{BridgeError, ByteStream};
    use bytes::Bytes;
    use mockall::mock;

    mock! {
        Store {}

        #[async_trait]
        impl BlobStore for Store {
            async fn get(&self, key: &str) -> BridgeResult<Option<Bytes>>;
            async fn put(&self, key: &str, data: Bytes) -> BridgeResult<()>;
        }
    }

    mock! {
        Fetcher {}

        #[async_trait]
        impl StreamingFetcher for Fetcher {
            async fn open(&self, url: &str) -> BridgeResult<ByteStream>;
        }
    }

    fn orchestrator(store: MockStore, fetcher: MockFetcher) -> CacheOrchestrator {
        CacheOrchestrator::new(CacheConfig::default(), Arc::new(store), Arc::new(fetcher))
            .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = CacheOrchestrator::new(
            CacheConfig::default().with_container_name(""),
            Arc::new(MockStore::new()),
            Arc::new(MockFetcher::new()),
        );
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_hit_skips_fetcher() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(Bytes::from_static(b"cached"))));
        store.expect_put().never();

        let mut fetcher = MockFetcher::new();
        fetcher.expect_open().never();

        let orchestrator = orchestrator(store, fetcher);
        let key = CacheKey::new("mainVideo").unwrap();
        let media = orchestrator
            .load(&key, "https://example.com/v.mp4")
            .await
            .unwrap();

        assert_eq!(media.origin, LoadOrigin::Cache);
        assert_eq!(media.size, 6);
        assert!(media.url().starts_with("blob:videos/"));
    }

    #[tokio::test]
    async fn test_miss_fetches_and_puts_once() {
        let mut store = MockStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));
        store
            .expect_put()
            .withf(|key, data| key.to_string() == "mainVideo" && &data[..] == b"abcdef")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut fetcher = MockFetcher::new();
        fetcher.expect_open().times(1).returning(|_| {
            Ok(ByteStream::from_chunks(
                Some(6),
                vec![Bytes::from_static(b"abc"), Bytes::from_static(b"def")],
            ))
        });

        let orchestrator = orchestrator(store, fetcher);
        let key = CacheKey::new("mainVideo").unwrap();
        let mut seen = Vec::new();
        let media = orchestrator
            .load_with_progress(&key, "https://example.com/v.mp4", |p| {
                seen.push(p.percent())
            })
            .await
            .unwrap();

        assert_eq!(media.origin, LoadOrigin::Network);
        assert_eq!(seen, vec![Some(50.0), Some(100.0)]);
    }

    #[tokio::test]
    async fn test_storage_read_failure_is_storage_error() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Err(BridgeError::StorageError("locked".into())));
        let mut fetcher = MockFetcher::new();
        fetcher.expect_open().never();

        let orchestrator = orchestrator(store, fetcher);
        let err = orchestrator
            .load(&CacheKey::default(), "https://example.com/v.mp4")
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::StorageError);
        assert!(err.message.contains("locked"));
    }

    #[tokio::test]
    async fn test_panicking_bridge_is_unknown() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_put().never();
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_open()
            .returning(|_| panic!("fetcher exploded"));

        let orchestrator = orchestrator(store, fetcher);
        let err = orchestrator
            .load(&CacheKey::default(), "https://example.com/v.mp4")
            .await
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::Unknown);
        assert!(err.message.contains("fetcher exploded"));
        assert_eq!(orchestrator.handles().live_handles(), 0);
    }

    #[tokio::test]
    async fn test_state_transitions_published() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(Bytes::from_static(b"x"))));
        let fetcher = MockFetcher::new();

        let bus = Arc::new(EventBus::new(32));
        let mut events = bus.subscribe();
        let orchestrator = orchestrator(store, fetcher).with_event_bus(Arc::clone(&bus));

        orchestrator
            .load(&CacheKey::default(), "https://example.com/v.mp4")
            .await
            .unwrap();

        let mut transitions = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let CoreEvent::Cache(CacheEvent::StateChanged { to, .. }) = event {
                transitions.push(to);
            }
        }
        assert_eq!(transitions, vec!["CheckingCache", "CacheHit", "Ready"]);
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "panic with non-string payload");
    }
}
