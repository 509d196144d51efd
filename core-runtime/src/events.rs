//! # Event Bus System
//!
//! Provides an event-driven channel for the media cache core using
//! `tokio::sync::broadcast`. Presentation layers subscribe to it to drive
//! loading indicators, progress bars and error text without being coupled to
//! the orchestrator.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: `CoreEvent` wrapping the domain-specific `CacheEvent`
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐   subscribe   ┌──────────────┐
//! │ CacheOrchestrator├──────────>│ EventBus  ├──────────────>│ Progress bar │
//! └──────────────────┘           │ (broadcast│               └──────────────┘
//!                                │  channel) │   subscribe   ┌──────────────┐
//!                                │           ├──────────────>│ Error banner │
//!                                └───────────┘               └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Cache(CacheEvent::CacheHit {
//!         key: "mainVideo".to_string(),
//!         size_bytes: 1024,
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Served from cache");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed `n`
//!   events. Non-fatal; progress events are the usual casualty.
//! - **`RecvError::Closed`**: all senders have been dropped (shutdown).
//!
//! Emitting with no subscribers returns an error; publishers treat that as
//! "nobody is listening" and carry on.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// One event per chunk is published during a download, so subscribers that
/// can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Cache and download events
    Cache(CacheEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Cache(CacheEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::CacheHit { .. }) => EventSeverity::Info,
            CoreEvent::Cache(CacheEvent::Persisted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Cache key the event refers to.
    pub fn key(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.key(),
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted while loading media through the cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// The load state machine moved to a new state.
    StateChanged {
        /// The cache key being loaded.
        key: String,
        /// Previous state name.
        from: String,
        /// New state name.
        to: String,
    },
    /// The object was found in local storage; no network access happens.
    CacheHit {
        /// The cache key.
        key: String,
        /// Size of the stored object.
        size_bytes: u64,
    },
    /// The network stream was opened.
    DownloadStarted {
        /// The cache key.
        key: String,
        /// Remote URL with query string and fragment removed.
        url: String,
        /// Size hint reported by the server, if any.
        total_bytes: Option<u64>,
    },
    /// One chunk was received.
    Progress {
        /// The cache key.
        key: String,
        /// Bytes received so far.
        received_bytes: u64,
        /// Total size if known.
        total_bytes: Option<u64>,
        /// Completion percentage (0-100), `None` when the size is unknown.
        percent: Option<f64>,
    },
    /// The complete object was written to storage.
    Persisted {
        /// The cache key.
        key: String,
        /// Size of the stored object.
        size_bytes: u64,
    },
    /// The load failed.
    Failed {
        /// The cache key.
        key: String,
        /// Failure category (`NetworkError`, `StorageError`, `Unknown`).
        kind: String,
        /// Human-readable error message.
        message: String,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::StateChanged { .. } => "Load state changed",
            CacheEvent::CacheHit { .. } => "Served from cache",
            CacheEvent::DownloadStarted { .. } => "Download started",
            CacheEvent::Progress { .. } => "Download in progress",
            CacheEvent::Persisted { .. } => "Stored in cache",
            CacheEvent::Failed { .. } => "Load failed",
        }
    }

    /// Cache key the event refers to.
    pub fn key(&self) -> &str {
        match self {
            CacheEvent::StateChanged { key, .. }
            | CacheEvent::CacheHit { key, .. }
            | CacheEvent::DownloadStarted { key, .. }
            | CacheEvent::Progress { key, .. }
            | CacheEvent::Persisted { key, .. }
            | CacheEvent::Failed { key, .. } => key,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{CacheEvent, CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let progress_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Cache(CacheEvent::Progress { .. })));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Restrict the stream to events for a single cache key.
    pub fn for_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.filter(move |event| event.key() == key)
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(key: &str, received: u64) -> CoreEvent {
        CoreEvent::Cache(CacheEvent::Progress {
            key: key.to_string(),
            received_bytes: received,
            total_bytes: Some(100),
            percent: Some(received as f64),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(progress("mainVideo", 1)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Cache(CacheEvent::DownloadStarted {
            key: "mainVideo".to_string(),
            url: "https://cdn.example.com/v.mp4".to_string(),
            total_bytes: None,
        });

        assert_eq!(bus.emit(event.clone()).unwrap(), 2);
        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Cache(CacheEvent::Failed { .. })));

        bus.emit(progress("mainVideo", 10)).ok();
        let failed = CoreEvent::Cache(CacheEvent::Failed {
            key: "mainVideo".to_string(),
            kind: "NetworkError".to_string(),
            message: "HTTP 404".to_string(),
        });
        bus.emit(failed.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), failed);
    }

    #[tokio::test]
    async fn test_event_stream_for_key() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).for_key("v2");

        bus.emit(progress("v1", 10)).ok();
        bus.emit(progress("v2", 20)).ok();

        assert_eq!(stream.recv().await.unwrap(), progress("v2", 20));
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(progress("mainVideo", i)).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let failed = CoreEvent::Cache(CacheEvent::Failed {
            key: "mainVideo".to_string(),
            kind: "StorageError".to_string(),
            message: "disk full".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let hit = CoreEvent::Cache(CacheEvent::CacheHit {
            key: "mainVideo".to_string(),
            size_bytes: 1,
        });
        assert_eq!(hit.severity(), EventSeverity::Info);

        assert_eq!(progress("mainVideo", 1).severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Cache(CacheEvent::StateChanged {
            key: "mainVideo".to_string(),
            from: "Fetching".to_string(),
            to: "Assembling".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Cache\""));
        assert!(json.contains("\"event\":\"StateChanged\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
        assert_eq!(deserialized.key(), "mainVideo");
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for i in 0..10 {
                bus1.emit(progress("v1", i)).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for i in 0..10 {
                bus2.emit(progress("v2", i)).ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }
}
