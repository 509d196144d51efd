//! Streaming Fetch Abstraction
//!
//! Provides an incremental, chunked download capability. The core never sees
//! the HTTP client itself, only the size hint and the chunk sequence.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;

use crate::error::Result;

/// A single open response body.
///
/// The stream is lazy, finite and not restartable. `next_chunk` returns
/// `Ok(None)` exactly once, when the body has been fully received.
pub struct ByteStream {
    content_length: Option<u64>,
    chunks: BoxStream<'static, Result<Bytes>>,
    finished: bool,
}

impl ByteStream {
    /// Wrap a chunk stream with an optional total-size hint.
    pub fn new(
        content_length: Option<u64>,
        chunks: impl futures::Stream<Item = Result<Bytes>> + Send + 'static,
    ) -> Self {
        Self {
            content_length,
            chunks: chunks.boxed(),
            finished: false,
        }
    }

    /// Build a stream from chunks that are already in memory.
    ///
    /// Mostly useful for adapters that receive the whole body at once and for tests.
    pub fn from_chunks(content_length: Option<u64>, chunks: Vec<Bytes>) -> Self {
        Self::new(content_length, stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Total size advertised by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Pull the next chunk.
    ///
    /// Empty chunks are skipped. After the end-of-stream signal has been
    /// returned, further calls keep returning `Ok(None)`.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match self.chunks.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => return Ok(Some(chunk)),
                Some(Err(e)) => {
                    self.finished = true;
                    return Err(e);
                }
                None => {
                    self.finished = true;
                    return Ok(None);
                }
            }
        }
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("content_length", &self.content_length)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Async streaming fetch trait
///
/// Implementations open a network stream for a URL. They must surface
/// transport failures as errors instead of silently truncating data:
/// - connection failures and resets
/// - non-success response status
/// - responses without a body
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::StreamingFetcher;
///
/// async fn total_size(fetcher: &dyn StreamingFetcher, url: &str) -> Result<u64> {
///     let mut stream = fetcher.open(url).await?;
///     let mut total = 0u64;
///     while let Some(chunk) = stream.next_chunk().await? {
///         total += chunk.len() as u64;
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait StreamingFetcher: Send + Sync {
    /// Open a stream for `url`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The host cannot be reached
    /// - The server answers with a non-success status
    /// - The response carries no body
    async fn open(&self, url: &str) -> Result<ByteStream>;
}
