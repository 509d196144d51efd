//! # Media Cache Module
//!
//! Loads media through a local blob store, downloading it only on a miss.
//!
//! ## Overview
//!
//! A load checks the store first. On a hit the stored bytes are handed back
//! immediately. On a miss the remote resource is streamed chunk by chunk,
//! progress is reported after every chunk, the assembled object is written to
//! the store in one `put`, and only then is a handle returned.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     CacheOrchestrator                  │
//! │  - load() / load_with_progress()       │
//! │  - spawn_load()                        │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> BlobStore (persistence)
//!          ├──> StreamingFetcher (downloads)
//!          ├──> PlaybackHandleFactory (handle URLs)
//!          └──> EventBus (optional state/progress events)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_cache::cache::{CacheConfig, CacheOrchestrator};
//! use core_cache::key::{CacheKey, SAMPLE_VIDEO_URL};
//!
//! # async fn example(orchestrator: &CacheOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
//! let key = CacheKey::default();
//! let media = orchestrator
//!     .load_with_progress(&key, SAMPLE_VIDEO_URL, |p| {
//!         if let Some(percent) = p.percent() {
//!             println!("{:.0}%", percent);
//!         }
//!     })
//!     .await?;
//!
//! println!("Play {}", media.url());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod state;

pub use config::{CacheConfig, DEFAULT_HANDLE_SCHEME, DEFAULT_PREALLOCATE_LIMIT_BYTES};
pub use orchestrator::{CacheOrchestrator, LoadOrigin, LoadResult, LoadTask, LoadedMedia};
pub use progress::DownloadProgress;
pub use state::LoadState;
