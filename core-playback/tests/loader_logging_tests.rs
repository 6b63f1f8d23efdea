//! Loader log output
//!
//! Installs the global subscriber, so it lives in its own test binary.

mod support;

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::{LogEntry, LogLevel, LoggerSink, SoundOptions, SoundStatus, SoundStatusObserver};
use core_playback::{AudioLoader, RetryPolicy};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use support::{FakeSoundFactory, Journal};

struct NullObserver;

impl SoundStatusObserver for NullObserver {
    fn on_status(&self, _status: SoundStatus) {}
}

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

#[tokio::test]
async fn test_loader_logs_sources_without_credentials() {
    let sink = Arc::new(CollectingSink::default());
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug)
            .with_logger_sink(sink.clone()),
    )
    .unwrap();

    let fake = FakeSoundFactory::new(Journal::default());
    let loader = AudioLoader::with_retry_policy(fake, RetryPolicy::no_retry());

    loader
        .load(
            "https://user:pw@cdn.test/voice/a.m4a?sig=secret",
            SoundOptions::default(),
            Arc::new(NullObserver),
        )
        .await
        .unwrap();
    assert!(loader
        .load(
            "https://cdn.test/voice/b.png?sig=secret",
            SoundOptions::default(),
            Arc::new(NullObserver),
        )
        .await
        .is_err());

    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    let entries = sink.entries.lock().clone();
    let source_of = |message: &str| {
        entries
            .iter()
            .find(|e| e.message == message)
            .and_then(|e| e.fields.get("source").cloned())
    };

    assert_eq!(
        source_of("Sound loaded").as_deref(),
        Some("https://cdn.test/…/a.m4a")
    );
    assert_eq!(
        source_of("Rejected invalid audio source").as_deref(),
        Some("https://cdn.test/…/b.png")
    );
    assert!(entries
        .iter()
        .flat_map(|e| e.fields.values())
        .all(|value| !value.contains("secret") && !value.contains("pw@")));
}
