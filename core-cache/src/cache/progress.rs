//! Download progress tracking

use serde::{Deserialize, Serialize};

/// Progress of a single download.
///
/// Within one fetch `received_bytes` only grows, so `percent()` never
/// decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Bytes received so far
    pub received_bytes: u64,

    /// Size announced by the server, if any
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Start tracking a download with an optional size hint.
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            received_bytes: 0,
            total_bytes,
        }
    }

    /// Record a received chunk.
    pub fn advance(&mut self, chunk_len: usize) {
        self.received_bytes = self.received_bytes.saturating_add(chunk_len as u64);
    }

    /// Completion percentage in `[0, 100]`, or `None` when the size is unknown.
    ///
    /// Servers that deliver more than they announced are clamped to 100.
    pub fn percent(&self) -> Option<f64> {
        let total = self.total_bytes?;
        if total == 0 {
            return Some(100.0);
        }
        let percent = (self.received_bytes as f64 / total as f64) * 100.0;
        Some(percent.min(100.0))
    }

    /// True when no total is known.
    pub fn is_indeterminate(&self) -> bool {
        self.total_bytes.is_none()
    }

    /// Whether a progress bar should be shown for this value.
    ///
    /// Only a determinate value above zero is worth displaying.
    pub fn is_displayable(&self) -> bool {
        self.percent().map_or(false, |p| p > 0.0)
    }

    /// True when more bytes arrived than were announced.
    pub fn is_over_delivered(&self) -> bool {
        self.total_bytes
            .map_or(false, |total| self.received_bytes > total)
    }

    /// Bytes still expected, if the size is known.
    pub fn remaining_bytes(&self) -> Option<u64> {
        self.total_bytes
            .map(|total| total.saturating_sub(self.received_bytes))
    }
}
