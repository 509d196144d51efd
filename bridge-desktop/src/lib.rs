//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `StreamingFetcher` using `reqwest` byte streams
//! - `BlobStore` backed by a SQLite table (`SqliteBlobStore`)
//! - `BlobStore` backed by one file per key (`FileBlobStore`)
//! - `LoggerSink` printing to the console (`ConsoleLogger`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestStreamingFetcher, SqliteBlobStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let fetcher = ReqwestStreamingFetcher::new()?;
//!     let store = SqliteBlobStore::new("VideoDB.sqlite".into(), "videos")?;
//!
//!     // Use in core configuration
//! }
//! ```

mod file_store;
mod http;
mod logger;
mod sqlite_store;

pub use file_store::FileBlobStore;
pub use http::ReqwestStreamingFetcher;
pub use logger::ConsoleLogger;
pub use sqlite_store::SqliteBlobStore;
