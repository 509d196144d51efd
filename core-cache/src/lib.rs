//! # Media Cache Core
//!
//! Stream a remote video once, keep it in a durable blob store, and serve it
//! from there on every later load.
//!
//! ## Overview
//!
//! This crate handles:
//! - Cache lookup by key before any network access
//! - Chunked downloads with per-chunk progress
//! - Whole-object persistence after a complete download
//! - Process-local playback handles with explicit release
//! - Structured failures (`NetworkError`, `StorageError`, `Unknown`)

pub mod cache;
pub mod error;
pub mod handle;
pub mod key;

pub use cache::{
    CacheConfig, CacheOrchestrator, DownloadProgress, LoadOrigin, LoadResult, LoadState,
    LoadTask, LoadedMedia,
};
pub use error::{CacheError, FailureKind, FailureReason, Result};
pub use handle::{PlaybackHandle, PlaybackHandleFactory};
pub use key::{CacheKey, CachedObject, DEFAULT_KEY, SAMPLE_VIDEO_URL};
