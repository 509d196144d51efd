//! # Playback Handles
//!
//! Turns a cached object into a process-local URL that a playback surface can
//! resolve, and revokes that URL when the caller is done with it.
//!
//! Handle URLs have the form `<scheme>:<container>/<uuid>`, e.g.
//! `blob:videos/1b4e28ba-2fa1-11d2-883f-0016d3cca427`.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::key::CachedObject;

type Registry = Arc<RwLock<HashMap<Uuid, CachedObject>>>;

/// Issues and tracks playback handles.
///
/// Clones share the same registry, so a handle created through one clone can
/// be resolved through another.
#[derive(Clone)]
pub struct PlaybackHandleFactory {
    scheme: String,
    container: String,
    registry: Registry,
}

impl PlaybackHandleFactory {
    pub fn new(scheme: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            container: container.into(),
            registry: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `object` and return a handle that keeps it resolvable.
    pub fn create(&self, object: CachedObject) -> PlaybackHandle {
        let id = Uuid::new_v4();
        let url = format!("{}:{}/{}", self.scheme, self.container, id);
        let size = object.len();

        self.registry.write().insert(id, object);
        debug!(handle = %url, size, "Created playback handle");

        PlaybackHandle {
            id,
            url,
            size,
            registry: Arc::clone(&self.registry),
            released: AtomicBool::new(false),
        }
    }

    /// Revoke a handle. Releasing twice is a no-op.
    pub fn release(&self, handle: &PlaybackHandle) {
        handle.release();
    }

    /// Look up the object behind a live handle URL.
    pub fn resolve(&self, url: &str) -> Option<CachedObject> {
        let id = self.parse_url(url)?;
        self.registry.read().get(&id).cloned()
    }

    /// Number of handles created and not yet released.
    pub fn live_handles(&self) -> usize {
        self.registry.read().len()
    }

    fn parse_url(&self, url: &str) -> Option<Uuid> {
        let rest = url.strip_prefix(self.scheme.as_str())?.strip_prefix(':')?;
        let id = rest
            .strip_prefix(self.container.as_str())?
            .strip_prefix('/')?;
        Uuid::parse_str(id).ok()
    }
}

impl fmt::Debug for PlaybackHandleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHandleFactory")
            .field("scheme", &self.scheme)
            .field("container", &self.container)
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

/// Caller-owned reference to cached bytes.
///
/// The URL stays resolvable until the handle is released or dropped.
pub struct PlaybackHandle {
    id: Uuid,
    url: String,
    size: usize,
    registry: Registry,
    released: AtomicBool,
}

impl PlaybackHandle {
    /// URL to hand to a media element.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Size of the referenced object in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Revoke the URL. Later calls do nothing.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.registry.write().remove(&self.id);
        debug!(handle = %self.url, "Released playback handle");
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("url", &self.url)
            .field("size", &self.size)
            .field("released", &self.is_released())
            .finish()
    }
}
