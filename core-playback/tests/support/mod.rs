//! In-memory bridge fakes shared by the integration tests.
//!
//! Every fake writes to one [`Journal`], so tests can assert on the global
//! ordering of platform calls across several sounds.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AudioEnvironment, AudioRouteConfigurator, AudioSource, ReadReceiptSink, RouteConfig,
    SettingsStore, SoundFactory, SoundHandle, SoundOptions, SoundStatus, SoundStatusObserver,
};
use core_playback::{
    AudioLoader, ItemId, MessagePlayer, OutputRouter, PlayableItem, PlaybackRegistry,
    PlayerContext, RetryPolicy,
};
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Journal
// ============================================================================

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

// ============================================================================
// Sound fakes
// ============================================================================

pub struct FakeSound {
    tag: String,
    journal: Journal,
    status: Mutex<SoundStatus>,
    observer: Arc<dyn SoundStatusObserver>,
    fail_commands: Arc<AtomicBool>,
}

impl FakeSound {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Pushes a status tick to the player, as a host audio thread would.
    pub fn push(&self, status: SoundStatus) {
        *self.status.lock() = status.clone();
        self.observer.on_status(status);
    }

    fn command(&self, name: &str) -> BridgeResult<()> {
        self.journal.record(format!("{}.{}", self.tag, name));
        if self.fail_commands.load(Ordering::SeqCst) {
            Err(BridgeError::OperationFailed(format!("{name} rejected")))
        } else {
            Ok(())
        }
    }
}

struct SoundRef(Arc<FakeSound>);

impl SoundHandle for SoundRef {
    fn play(&self) -> BridgeResult<()> {
        self.0.command("play")?;
        self.0.status.lock().is_playing = true;
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        self.0.command("pause")?;
        self.0.status.lock().is_playing = false;
        Ok(())
    }

    fn seek(&self, position: Duration) -> BridgeResult<()> {
        self.0
            .command(&format!("seek:{}", position.as_millis()))?;
        self.0.status.lock().position_millis = position.as_millis() as u64;
        Ok(())
    }

    fn unload(&self) -> BridgeResult<()> {
        self.0.journal.record(format!("{}.unload", self.0.tag));
        self.0.status.lock().is_loaded = false;
        Ok(())
    }

    fn status(&self) -> SoundStatus {
        self.0.status.lock().clone()
    }
}

/// Scripted result of one `create` call.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Loaded,
    NotLoaded,
    Fail(String),
}

#[derive(Default)]
pub struct FakeSoundFactory {
    journal: Journal,
    script: Mutex<VecDeque<CreateOutcome>>,
    always_fail: AtomicBool,
    sounds: Mutex<Vec<Arc<FakeSound>>>,
    creates: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    fail_commands: Arc<AtomicBool>,
    duration_millis: Mutex<Option<u64>>,
}

impl FakeSoundFactory {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            duration_millis: Mutex::new(Some(4_000)),
            ..Default::default()
        })
    }

    pub fn script(&self, outcomes: impl IntoIterator<Item = CreateOutcome>) {
        self.script.lock().extend(outcomes);
    }

    /// Duration reported by newly created sounds; `None` means unknown.
    pub fn set_duration(&self, duration_millis: Option<u64>) {
        *self.duration_millis.lock() = duration_millis;
    }

    pub fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    /// Makes subsequent `create` calls wait until the returned notify fires.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }

    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Most recently created sound with the given tag.
    pub fn sound(&self, tag: &str) -> Arc<FakeSound> {
        self.sounds
            .lock()
            .iter()
            .rev()
            .find(|s| s.tag == tag)
            .cloned()
            .unwrap_or_else(|| panic!("no sound created for {tag}"))
    }
}

fn tag_for(source: &AudioSource) -> String {
    let uri = source.uri();
    let file = uri.rsplit('/').next().unwrap_or_default();
    file.split('.').next().unwrap_or_default().to_string()
}

#[async_trait]
impl SoundFactory for FakeSoundFactory {
    async fn create(
        &self,
        source: &AudioSource,
        _options: SoundOptions,
        observer: Arc<dyn SoundStatusObserver>,
    ) -> BridgeResult<Box<dyn SoundHandle>> {
        let tag = tag_for(source);
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("create:{tag}"));

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let outcome = if self.always_fail.load(Ordering::SeqCst) {
            CreateOutcome::Fail("404 not found".to_string())
        } else {
            self.script.lock().pop_front().unwrap_or(CreateOutcome::Loaded)
        };

        let status = match outcome {
            CreateOutcome::Fail(message) => return Err(BridgeError::OperationFailed(message)),
            CreateOutcome::NotLoaded => SoundStatus::default(),
            CreateOutcome::Loaded => SoundStatus::loaded(0, *self.duration_millis.lock()),
        };

        let sound = Arc::new(FakeSound {
            tag,
            journal: self.journal.clone(),
            status: Mutex::new(status),
            observer,
            fail_commands: self.fail_commands.clone(),
        });
        self.sounds.lock().push(sound.clone());
        Ok(Box::new(SoundRef(sound)))
    }
}

// ============================================================================
// Route and settings fakes
// ============================================================================

#[derive(Default)]
pub struct FakeEnvironment {
    pub external: AtomicBool,
    pub silent: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeEnvironment {
    /// Makes the next device probe wait until the returned notify fires.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }
}

#[async_trait]
impl AudioEnvironment for FakeEnvironment {
    async fn has_external_output(&self) -> BridgeResult<bool> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.external.load(Ordering::SeqCst))
    }

    async fn is_silent_mode(&self) -> BridgeResult<bool> {
        Ok(self.silent.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct RecordingConfigurator {
    pub applied: Mutex<Vec<RouteConfig>>,
}

#[async_trait]
impl AudioRouteConfigurator for RecordingConfigurator {
    async fn apply_route_config(&self, config: RouteConfig) -> BridgeResult<()> {
        self.applied.lock().push(config);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReceipts {
    pub marked: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ReadReceiptSink for RecordingReceipts {
    async fn mark_listened(&self, item_id: &str) -> BridgeResult<()> {
        self.marked.lock().push(item_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            Err(BridgeError::OperationFailed("receipt endpoint down".into()))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub journal: Journal,
    pub factory: Arc<FakeSoundFactory>,
    pub environment: Arc<FakeEnvironment>,
    pub configurator: Arc<RecordingConfigurator>,
    pub settings: Arc<MemorySettings>,
    pub receipts: Arc<RecordingReceipts>,
    pub registry: Arc<PlaybackRegistry>,
    pub events: EventBus,
    pub context: PlayerContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_retry(RetryPolicy::no_retry())
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        let journal = Journal::default();
        let factory = FakeSoundFactory::new(journal.clone());
        let environment = Arc::new(FakeEnvironment::default());
        let configurator = Arc::new(RecordingConfigurator::default());
        let settings = Arc::new(MemorySettings::default());
        let receipts = Arc::new(RecordingReceipts::default());
        let registry = PlaybackRegistry::new();
        let events = EventBus::new(64);

        let router = Arc::new(OutputRouter::new(
            configurator.clone(),
            environment.clone(),
            settings.clone(),
            events.clone(),
        ));

        let context = PlayerContext {
            registry: registry.clone(),
            router,
            loader: AudioLoader::with_retry_policy(factory.clone(), retry),
            events: events.clone(),
            read_receipts: Some(receipts.clone()),
        };

        Self {
            journal,
            factory,
            environment,
            configurator,
            settings,
            receipts,
            registry,
            events,
            context,
        }
    }

    pub fn item(id: &str) -> PlayableItem {
        PlayableItem::new(id, format!("https://cdn.test/voice/{id}.m4a"), 4_000)
    }

    pub fn mount(&self, id: &str) -> MessagePlayer {
        MessagePlayer::mount(Self::item(id), self.context.clone())
    }

    pub fn mount_item(&self, item: PlayableItem) -> MessagePlayer {
        MessagePlayer::mount(item, self.context.clone())
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.registry.is_active(&ItemId::from(id))
    }
}
