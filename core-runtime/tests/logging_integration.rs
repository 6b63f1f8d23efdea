//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, strip_url, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

// Only one global subscriber per process, so initialization is covered by a
// single test.
#[test]
fn test_sink_receives_core_events_once_initialized() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Info)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).unwrap();

    tracing::info!(target: "core_playback", item_id = "msg-1", "Playback started");
    tracing::debug!(target: "core_playback", "Below the sink threshold");
    tracing::info!(target: "some_dependency", "Filtered out by default directives");

    let entries = sink.entries.lock().unwrap().clone();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "Playback started");
    assert_eq!(entries[0].target, "core_playback");
    assert_eq!(entries[0].fields.get("item_id").map(String::as_str), Some("msg-1"));

    assert!(matches!(init_logging(config), Err(Error::LoggingInitialized(_))));
}

#[test]
fn test_credential_fields_are_redacted() {
    assert_eq!(redact_if_sensitive("bearer_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("item_id", "msg-7"), "msg-7");
    assert_eq!(redact_if_sensitive("duration_ms", "4000"), "4000");
}

#[test]
fn test_signed_urls_are_stripped() {
    assert_eq!(
        strip_url("https://user:pw@cdn.test/a/b/voice.ogg?sig=123&exp=9"),
        "https://cdn.test/…/voice.ogg"
    );
    assert_eq!(strip_url("file:///var/mobile/tmp/rec.m4a"), "file://…/rec.m4a");
    assert_eq!(strip_url("not a url/clip.mp3"), "clip.mp3");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_custom_filter_overrides_level() {
    let config = LoggingConfig::default()
        .with_level(LogLevel::Warn)
        .with_filter("core_playback=trace,core_service=debug");

    assert_eq!(
        config.filter.as_deref(),
        Some("core_playback=trace,core_service=debug")
    );
    assert_eq!(config.level, LogLevel::Warn);
}
