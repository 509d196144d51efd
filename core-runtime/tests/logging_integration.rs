//! Integration tests for logging system

use bridge_traits::logging::LogLevel;
use core_runtime::logging::{redact_url, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_logging_configuration() {
    // Logging can only be initialized once per process, so only the builder is checked here
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_url_redaction(true)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.redact_urls);
    assert!(config.enable_spans);
}

#[test]
fn test_signed_urls_are_redacted() {
    assert_eq!(
        redact_url("https://videos.pexels.com/video-files/1/clip.mp4?token=abc&expires=99"),
        "https://videos.pexels.com/video-files/1/clip.mp4"
    );
    assert_eq!(
        redact_url("https://cdn.example.com/v.mp4#t=30"),
        "https://cdn.example.com/v.mp4"
    );
}

#[test]
fn test_plain_urls_pass_through() {
    assert_eq!(
        redact_url("https://cdn.example.com/v.mp4"),
        "https://cdn.example.com/v.mp4"
    );
    assert_eq!(redact_url("blob:videos/1234"), "blob:videos/1234");
    assert_eq!(redact_url(""), "");
}

#[test]
fn test_path_stripping() {
    // Unix paths
    assert_eq!(strip_path("/home/user/.local/share/app/VideoDB.sqlite"), "VideoDB.sqlite");

    // Windows paths
    assert_eq!(strip_path("C:\\Users\\John\\AppData\\VideoDB.sqlite"), "VideoDB.sqlite");

    // Already basename
    assert_eq!(strip_path("clip.blob"), "clip.blob");

    // Edge cases
    assert_eq!(strip_path("/var/cache/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[cfg(not(debug_assertions))]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Json);
    }
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_cache=debug,sqlx=trace");

    assert_eq!(
        config.filter,
        Some("core_cache=debug,sqlx=trace".to_string())
    );
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_url_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_urls);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
