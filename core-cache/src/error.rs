//! # Cache Error Types
//!
//! Internal errors raised while loading media, and the caller-facing
//! [`FailureReason`] they are folded into at the orchestrator boundary.

use bridge_traits::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while loading media through the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Cache key was empty.
    #[error("Cache key must not be empty")]
    EmptyKey,

    /// Cache configuration is invalid.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Network Errors
    // ========================================================================
    /// Opening or reading the network stream failed.
    #[error("Network request failed: {0}")]
    Network(#[source] BridgeError),

    /// The stream ended before the announced size was received.
    #[error("Stream ended early: received {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    // ========================================================================
    // Storage Errors
    // ========================================================================
    /// Reading from or writing to the blob store failed.
    #[error("Storage operation failed: {0}")]
    Storage(#[source] BridgeError),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// A bridge implementation panicked.
    #[error("Load aborted unexpectedly: {0}")]
    Panicked(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Classify an error from the network bridge.
    ///
    /// Anything the fetcher reports about the request itself (bad URL,
    /// transport, status, body) is a network failure; a missing capability
    /// is not.
    pub fn from_fetch(err: BridgeError) -> Self {
        if err.is_network_error() || matches!(err, BridgeError::OperationFailed(_)) {
            CacheError::Network(err)
        } else {
            CacheError::Internal(err.to_string())
        }
    }

    /// Failure category reported to callers.
    pub fn kind(&self) -> FailureKind {
        match self {
            CacheError::Network(_) | CacheError::Truncated { .. } => FailureKind::NetworkError,
            CacheError::Storage(_) => FailureKind::StorageError,
            CacheError::EmptyKey
            | CacheError::InvalidConfig(_)
            | CacheError::Panicked(_)
            | CacheError::Internal(_) => FailureKind::Unknown,
        }
    }

    /// Returns `true` if retrying the load may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), FailureKind::NetworkError)
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Failure category surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Host unreachable, non-success status, missing body or truncated stream.
    NetworkError,
    /// The blob store could not be opened, read or written.
    StorageError,
    /// Anything else, including panics inside bridge implementations.
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkError => "NetworkError",
            FailureKind::StorageError => "StorageError",
            FailureKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned instead of an unhandled fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<CacheError> for FailureReason {
    fn from(err: CacheError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            CacheError::Network(BridgeError::Transport("reset".into())).kind(),
            FailureKind::NetworkError
        );
        assert_eq!(
            CacheError::Truncated {
                received: 5,
                expected: 10
            }
            .kind(),
            FailureKind::NetworkError
        );
        assert_eq!(
            CacheError::Storage(BridgeError::StorageError("disk full".into())).kind(),
            FailureKind::StorageError
        );
        assert_eq!(
            CacheError::Panicked("boom".into()).kind(),
            FailureKind::Unknown
        );
    }

    #[test]
    fn test_from_fetch_classifies_bridge_errors() {
        let err = CacheError::from_fetch(BridgeError::HttpStatus {
            status: 404,
            url: "https://example.com/v.mp4".into(),
        });
        assert_eq!(err.kind(), FailureKind::NetworkError);
        assert!(err.is_transient());

        let err = CacheError::from_fetch(BridgeError::NotAvailable("no client".into()));
        assert_eq!(err.kind(), FailureKind::Unknown);
    }

    #[test]
    fn test_failure_reason_from_cache_error() {
        let reason = FailureReason::from(CacheError::Truncated {
            received: 3,
            expected: 9,
        });
        assert_eq!(reason.kind, FailureKind::NetworkError);
        assert!(reason.message.contains("received 3 of 9 bytes"));
        assert!(reason.to_string().starts_with("NetworkError: "));
    }
}
