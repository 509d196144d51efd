//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the media
//! cache core.
//!
//! ## Overview
//!
//! The core never talks to a concrete HTTP client or storage engine. It relies
//! on the capabilities below, which hosts provide per platform.
//!
//! ## Traits
//!
//! - [`StreamingFetcher`](http::StreamingFetcher) - Opens a chunked network stream with an optional size hint
//! - [`BlobStore`](storage::BlobStore) - Durable keyed binary store with whole-object writes
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Mobile   | TBD                 | 📋 Planned |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep the message actionable
//! (status codes, URLs without query strings, store names).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one adapter instance can serve
//! concurrent loads.
//!
//! ## Examples
//!
//! ### Implementing StreamingFetcher
//!
//! ```ignore
//! use bridge_traits::http::{ByteStream, StreamingFetcher};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyFetcher;
//!
//! #[async_trait]
//! impl StreamingFetcher for MyFetcher {
//!     async fn open(&self, url: &str) -> Result<ByteStream> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

pub use http::{ByteStream, StreamingFetcher};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use storage::BlobStore;
