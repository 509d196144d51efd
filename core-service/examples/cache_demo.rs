//! Loads the sample video through the cache and prints the playback handle.
//!
//! Run twice: the first run downloads and reports progress, the second is
//! served from the local store.
//!
//! ```text
//! cargo run -p core-service --example cache_demo [URL]
//! ```

use anyhow::Context;
use core_cache::{CacheKey, SAMPLE_VIDEO_URL};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::CoreService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .context("failed to initialize logging")?;

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SAMPLE_VIDEO_URL.to_string());
    let data_dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("media-cache-demo");

    let config = CoreConfig::builder().data_dir(&data_dir).build()?;
    let service = CoreService::new(config)?;
    service.initialize().await?;

    let mut task = service.spawn_load(CacheKey::default(), url);
    while let Some(progress) = task.next_progress().await {
        if let Some(percent) = progress.percent().filter(|_| progress.is_displayable()) {
            println!("Downloading: {:.1}%", percent);
        }
    }

    match task.wait().await {
        Ok(media) => {
            println!(
                "Ready ({:?}, {} bytes): {}",
                media.origin,
                media.size,
                media.url()
            );
            media.handle.release();
        }
        Err(reason) => eprintln!("Failed to load video: {}", reason.message),
    }

    Ok(())
}
