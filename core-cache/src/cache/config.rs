//! Cache configuration

use core_runtime::config::DEFAULT_CONTAINER_NAME;

/// Scheme used for playback handle URLs.
pub const DEFAULT_HANDLE_SCHEME: &str = "blob";

/// Upper bound on the download buffer reserved up front from the size hint.
pub const DEFAULT_PREALLOCATE_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Configuration for the cache orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Container the media is stored under (default: "videos")
    pub container_name: String,

    /// Scheme of generated handle URLs (default: "blob")
    pub handle_scheme: String,

    /// Largest buffer reserved from the server's size hint (default: 64 MiB).
    ///
    /// Larger downloads still work; the buffer grows as chunks arrive.
    pub preallocate_limit_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            handle_scheme: DEFAULT_HANDLE_SCHEME.to_string(),
            preallocate_limit_bytes: DEFAULT_PREALLOCATE_LIMIT_BYTES,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set container name.
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    /// Set handle URL scheme.
    pub fn with_handle_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.handle_scheme = scheme.into();
        self
    }

    /// Set preallocation limit.
    pub fn with_preallocate_limit(mut self, bytes: usize) -> Self {
        self.preallocate_limit_bytes = bytes;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.container_name.is_empty() {
            return Err("container_name cannot be empty".to_string());
        }

        let mut chars = self.handle_scheme.chars();
        let starts_alpha = chars.next().map_or(false, |c| c.is_ascii_alphabetic());
        if !starts_alpha
            || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(format!(
                "handle_scheme is not a valid URL scheme: {:?}",
                self.handle_scheme
            ));
        }

        Ok(())
    }
}
