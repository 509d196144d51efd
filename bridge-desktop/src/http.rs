//! Streaming Fetcher Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{ByteStream, StreamingFetcher},
};
use futures_util::TryStreamExt;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_USER_AGENT: &str = concat!("media-cache-core/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based streaming fetcher
///
/// Provides chunked downloads with:
/// - Connection pooling via reqwest
/// - TLS support by default
/// - No overall request timeout, only a connect timeout; large media bodies
///   can legitimately take minutes
pub struct ReqwestStreamingFetcher {
    client: Client,
}

impl ReqwestStreamingFetcher {
    /// Create a fetcher with the default connect timeout.
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Create a fetcher with a custom connect timeout.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        Self::with_options(connect_timeout, DEFAULT_USER_AGENT)
    }

    /// Create a fetcher with a custom connect timeout and user agent.
    pub fn with_options(connect_timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(10)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Create a fetcher around an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// URL without query string or fragment, safe to log and put in errors.
    fn display_url(url: &Url) -> String {
        let mut shown = url.clone();
        shown.set_query(None);
        shown.set_fragment(None);
        shown.to_string()
    }

    fn map_send_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Transport("Connection timed out".to_string())
        } else if e.is_connect() {
            BridgeError::Transport(format!("Connection failed: {}", e.without_url()))
        } else if e.is_builder() {
            BridgeError::OperationFailed(format!("Invalid request: {}", e.without_url()))
        } else {
            BridgeError::Transport(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl StreamingFetcher for ReqwestStreamingFetcher {
    #[instrument(skip(self, url))]
    async fn open(&self, url: &str) -> Result<ByteStream> {
        let parsed = Url::parse(url)
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid URL: {}", e)))?;
        let shown = Self::display_url(&parsed);

        debug!(url = %shown, "Opening HTTP stream");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %shown, "HTTP stream rejected");
            return Err(BridgeError::HttpStatus {
                status: status.as_u16(),
                url: shown,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Err(BridgeError::MissingBody(shown));
        }

        let content_length = response.content_length();
        debug!(
            status = status.as_u16(),
            content_length = ?content_length,
            "HTTP stream opened"
        );

        let chunks = response
            .bytes_stream()
            .map_err(|e| BridgeError::StreamInterrupted(e.without_url().to_string()));

        Ok(ByteStream::new(content_length, chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_creation() {
        assert!(ReqwestStreamingFetcher::new().is_ok());
        assert!(
            ReqwestStreamingFetcher::with_options(Duration::from_secs(3), "demo-player/1.0").is_ok()
        );
    }

    #[test]
    fn test_display_url_strips_query_and_fragment() {
        let url = Url::parse("https://cdn.example.com/v/1.mp4?token=secret#t=10").unwrap();
        assert_eq!(
            ReqwestStreamingFetcher::display_url(&url),
            "https://cdn.example.com/v/1.mp4"
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let fetcher = ReqwestStreamingFetcher::new().unwrap();
        let err = fetcher.open("not a url").await.unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }
}
