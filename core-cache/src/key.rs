//! Cache keys and cached objects

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CacheError, Result};

/// Slot used by the single-video player.
pub const DEFAULT_KEY: &str = "mainVideo";

/// Sample clip loaded by the demo program.
pub const SAMPLE_VIDEO_URL: &str =
    "https://videos.pexels.com/video-files/6251392/6251392-uhd_2732_1440_24fps.mp4";

/// Name of a logical video slot, stable across sessions.
///
/// Keys are opaque, non-empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a key, rejecting empty input.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self(DEFAULT_KEY.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CacheKey {
    type Error = CacheError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Complete binary content of a cached video.
///
/// Immutable once built; clones share the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedObject {
    data: Bytes,
}

impl CachedObject {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Cheap handle to the underlying buffer.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl fmt::Debug for CachedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedObject")
            .field("len", &self.data.len())
            .finish()
    }
}

impl From<Bytes> for CachedObject {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}
