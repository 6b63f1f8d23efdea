//! # Message Player
//!
//! Per-message playback state machine.
//!
//! ```text
//! Idle --play--> Loading --loaded--> ReadyPaused <--pause/preempt-- Playing
//!                   |                     \------------play--------->/
//!                   v                                               |
//!                Errored <--status error---------------------------+
//!                   \--retry--> Loading          Playing --finished--> Idle
//! ```
//!
//! Every await is followed by a check of the mounted flag and the load
//! generation; results that arrive for an unmounted or reset player are
//! unloaded without touching state. Internal locks are never held across an
//! await or while calling into the registry.

use bridge_traits::{BridgeError, ReadReceiptSink, SoundHandle, SoundStatus, SoundStatusObserver};
use core_runtime::events::{EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::{PlayerPhase, PlayerStatus};
use crate::error::{PlaybackError, Result};
use crate::format::{display_duration, format_duration};
use crate::item::{ItemId, PlayableItem};
use crate::loader::AudioLoader;
use crate::registry::{PlaybackRegistry, Registration};
use crate::router::OutputRouter;

/// Session-wide collaborators shared by every player.
#[derive(Clone)]
pub struct PlayerContext {
    pub registry: Arc<PlaybackRegistry>,
    pub router: Arc<OutputRouter>,
    pub loader: AudioLoader,
    pub events: EventBus,
    pub read_receipts: Option<Arc<dyn ReadReceiptSink>>,
}

impl std::fmt::Debug for PlayerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerContext")
            .field("registry", &self.registry)
            .field("router", &self.router)
            .field("loader", &self.loader)
            .field("read_receipts", &self.read_receipts.is_some())
            .finish()
    }
}

struct PlayerCore {
    phase: PlayerPhase,
    status: PlayerStatus,
    handle: Option<Arc<dyn SoundHandle>>,
    /// Load generation the held handle was created under.
    handle_generation: u64,
    last_error: Option<String>,
}

struct PlayerInner {
    item: PlayableItem,
    context: PlayerContext,
    core: Mutex<PlayerCore>,
    load_in_flight: AtomicBool,
    load_finished: Notify,
    mounted: AtomicBool,
    generation: AtomicU64,
    registration: Mutex<Option<Registration>>,
}

/// Clears the in-flight flag however the load path exits and wakes any
/// caller waiting on it.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    finished: &'a Notify,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.finished.notify_waiters();
    }
}

/// Routes status ticks of one load generation back to its player.
struct HandleObserver {
    player: Weak<PlayerInner>,
    generation: u64,
}

impl SoundStatusObserver for HandleObserver {
    fn on_status(&self, status: SoundStatus) {
        if let Some(player) = self.player.upgrade() {
            player.on_status(self.generation, status);
        }
    }
}

fn millis_to_secs(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

impl PlayerInner {
    fn id(&self) -> &ItemId {
        &self.item.id
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    fn emit(&self, event: PlaybackEvent) {
        self.context.events.emit_playback(event);
    }

    fn release_active(&self) {
        self.context.registry.clear_if_active(self.id());
    }

    fn unload_quietly(&self, handle: &Arc<dyn SoundHandle>) {
        if let Err(e) = handle.unload() {
            debug!(item_id = %self.id(), error = %e, "Failed to unload sound");
        }
    }

    async fn play(self: &Arc<Self>) -> Result<()> {
        if !self.is_mounted() {
            return Err(PlaybackError::NotMounted);
        }

        {
            let core = self.core.lock();
            match core.phase {
                PlayerPhase::Playing => return Ok(()),
                PlayerPhase::Errored => {
                    debug!(item_id = %self.id(), "Ignoring play on errored player; retry first");
                    return Ok(());
                }
                PlayerPhase::Loading => return Ok(()),
                PlayerPhase::Idle | PlayerPhase::ReadyPaused => {}
            }
        }

        let mode = self.context.router.configure_for_playback().await;
        if !self.is_mounted() {
            return Err(PlaybackError::NotMounted);
        }
        debug!(item_id = %self.id(), mode = %mode, "Route configured");

        self.context.registry.set_active(Some(self.id().clone()));

        let existing = self.core.lock().handle.clone();
        let handle = match existing {
            Some(handle) => handle,
            None => match self.load().await? {
                Some(handle) => handle,
                None => {
                    // Another load (typically a preload) owns the handle.
                    self.wait_for_load().await;
                    if !self.is_mounted() {
                        return Err(PlaybackError::NotMounted);
                    }
                    let existing = self.core.lock().handle.clone();
                    match existing {
                        Some(handle) => handle,
                        None => {
                            // Failed or reset; nothing will play.
                            self.release_active();
                            return Ok(());
                        }
                    }
                }
            },
        };

        if !self.is_mounted() {
            return Err(PlaybackError::NotMounted);
        }

        // Holding the registry lock keeps a concurrent activation from
        // slipping in between the check and the play command.
        let start = || -> std::result::Result<bool, BridgeError> {
            if self.core.lock().phase == PlayerPhase::Playing {
                return Ok(false);
            }
            handle.play()?;
            let mut core = self.core.lock();
            core.phase = PlayerPhase::Playing;
            core.status.is_playing = true;
            Ok(true)
        };
        let outcome = self.context.registry.run_if_active(self.id(), start);

        match outcome {
            None => {
                debug!(item_id = %self.id(), "Another message became active during load");
                Ok(())
            }
            Some(Ok(false)) => Ok(()),
            Some(Ok(true)) => {
                info!(item_id = %self.id(), "Playback started");
                self.emit(PlaybackEvent::Started {
                    item_id: self.id().to_string(),
                });
                self.send_read_receipt();
                Ok(())
            }
            Some(Err(e)) => Err(self.command_failed("play", e)),
        }
    }

    async fn wait_for_load(&self) {
        loop {
            let mut finished = std::pin::pin!(self.load_finished.notified());
            finished.as_mut().enable();
            if !self.load_in_flight.load(Ordering::Acquire) {
                return;
            }
            finished.await;
        }
    }

    /// Loads a handle behind the in-flight guard.
    ///
    /// Returns `Ok(None)` when another load is already running or the result
    /// was superseded by a reset.
    async fn load(self: &Arc<Self>) -> Result<Option<Arc<dyn SoundHandle>>> {
        if self
            .load_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(item_id = %self.id(), "Load already in flight");
            return Ok(None);
        }
        let _in_flight = InFlightGuard {
            flag: &self.load_in_flight,
            finished: &self.load_finished,
        };

        let load_generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        {
            let mut core = self.core.lock();
            core.phase = PlayerPhase::Loading;
            core.status.is_loading = true;
            core.status.has_error = false;
        }

        let observer = Arc::new(HandleObserver {
            player: Arc::downgrade(self),
            generation: load_generation,
        });
        let result = self
            .context
            .loader
            .load_default(&self.item.source_ref, observer)
            .await;

        let current = self.generation.load(Ordering::Acquire) == load_generation;
        if !self.is_mounted() || !current {
            if let Ok(handle) = &result {
                debug!(item_id = %self.id(), "Discarding sound loaded for a stale player");
                self.unload_quietly(handle);
            }
            return if self.is_mounted() {
                Ok(None)
            } else {
                Err(PlaybackError::NotMounted)
            };
        }

        match result {
            Ok(handle) => {
                let initial = handle.status();
                let mut core = self.core.lock();
                core.handle = Some(handle.clone());
                core.handle_generation = load_generation;
                core.phase = PlayerPhase::ReadyPaused;
                core.status.is_loading = false;
                core.status.position_secs = millis_to_secs(initial.position_millis);
                if let Some(duration) = initial.duration_millis {
                    core.status.duration_secs = Some(millis_to_secs(duration));
                }
                Ok(Some(handle))
            }
            Err(e) => {
                {
                    let mut core = self.core.lock();
                    core.phase = PlayerPhase::Errored;
                    core.status.is_loading = false;
                    core.status.is_playing = false;
                    core.status.has_error = true;
                    core.last_error = Some(e.to_string());
                }
                self.release_active();

                warn!(item_id = %self.id(), error = %e, "Evicting message after load failure");
                self.emit(PlaybackEvent::Evicted {
                    item_id: self.id().to_string(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn pause(&self) -> Result<()> {
        let handle = {
            let core = self.core.lock();
            if core.phase != PlayerPhase::Playing {
                return Ok(());
            }
            match core.handle.clone() {
                Some(handle) => handle,
                None => return Ok(()),
            }
        };

        if let Err(e) = handle.pause() {
            return Err(self.command_failed("pause", e));
        }

        let position_secs = {
            let mut core = self.core.lock();
            core.phase = PlayerPhase::ReadyPaused;
            core.status.is_playing = false;
            core.status.position_secs
        };

        debug!(item_id = %self.id(), position_secs, "Playback paused");
        self.emit(PlaybackEvent::Paused {
            item_id: self.id().to_string(),
            position_ms: (position_secs * 1000.0) as u64,
        });
        self.release_active();
        Ok(())
    }

    fn seek(&self, position_secs: f64) -> Result<()> {
        let position_secs = if position_secs.is_finite() {
            position_secs.max(0.0)
        } else {
            0.0
        };

        let (handle, position_secs) = {
            let core = self.core.lock();
            let Some(handle) = core.handle.clone() else {
                debug!(item_id = %self.id(), "Ignoring seek without a loaded sound");
                return Ok(());
            };
            let position_secs = match core.status.duration_secs {
                Some(duration) => position_secs.min(duration),
                None => position_secs,
            };
            (handle, position_secs)
        };

        let Ok(position) = Duration::try_from_secs_f64(position_secs) else {
            return Err(PlaybackError::CommandFailed {
                command: "seek",
                message: format!("position {position_secs}s is out of range"),
            });
        };

        if let Err(e) = handle.seek(position) {
            return Err(self.command_failed("seek", e));
        }

        self.core.lock().status.position_secs = position_secs;
        Ok(())
    }

    fn command_failed(&self, command: &'static str, error: BridgeError) -> PlaybackError {
        {
            let mut core = self.core.lock();
            core.phase = if core.handle.is_some() {
                PlayerPhase::ReadyPaused
            } else {
                PlayerPhase::Idle
            };
            core.status.is_playing = false;
        }
        self.release_active();

        let err = PlaybackError::CommandFailed {
            command,
            message: error.to_string(),
        };
        warn!(item_id = %self.id(), error = %err, "Playback command failed");
        self.emit(PlaybackEvent::Notice {
            item_id: self.id().to_string(),
            message: err.to_string(),
        });
        err
    }

    fn reset(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let handle = {
            let mut core = self.core.lock();
            core.phase = PlayerPhase::Idle;
            core.status.is_loading = false;
            core.status.is_playing = false;
            core.status.has_error = false;
            core.status.position_secs = 0.0;
            core.last_error = None;
            core.handle.take()
        };

        self.release_active();
        if let Some(handle) = handle {
            self.unload_quietly(&handle);
        }
        debug!(item_id = %self.id(), "Player reset");
    }

    fn unmount(&self) {
        if !self.mounted.swap(false, Ordering::AcqRel) {
            return;
        }
        self.generation.fetch_add(1, Ordering::AcqRel);

        let handle = {
            let mut core = self.core.lock();
            core.phase = PlayerPhase::Idle;
            core.status.is_loading = false;
            core.status.is_playing = false;
            core.handle.take()
        };

        self.release_active();
        if let Some(handle) = handle {
            self.unload_quietly(&handle);
        }

        let registration = self.registration.lock().take();
        drop(registration);
        debug!(item_id = %self.id(), "Player unmounted");
    }

    /// Registry stop callback.
    fn on_stop(&self) {
        let handle = {
            let mut core = self.core.lock();
            if core.phase != PlayerPhase::Playing {
                return;
            }
            core.phase = PlayerPhase::ReadyPaused;
            core.status.is_playing = false;
            core.status.position_secs = 0.0;
            core.handle.clone()
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.pause() {
                warn!(item_id = %self.id(), error = %e, "Failed to pause preempted sound");
            }
            if let Err(e) = handle.seek(Duration::ZERO) {
                warn!(item_id = %self.id(), error = %e, "Failed to rewind preempted sound");
            }
        }

        debug!(item_id = %self.id(), "Playback preempted");
        self.emit(PlaybackEvent::Preempted {
            item_id: self.id().to_string(),
        });
    }

    fn on_status(&self, generation: u64, status: SoundStatus) {
        if !self.is_mounted() {
            return;
        }

        let mut core = self.core.lock();
        if core.handle.is_none() || core.handle_generation != generation {
            return;
        }

        if let Some(message) = status.error {
            let handle = core.handle.take();
            core.phase = PlayerPhase::Errored;
            core.status.is_playing = false;
            core.status.has_error = true;
            core.last_error = Some(message.clone());
            drop(core);

            if let Some(handle) = handle {
                self.unload_quietly(&handle);
            }
            self.release_active();

            warn!(item_id = %self.id(), error = %message, "Sound reported an error");
            self.emit(PlaybackEvent::Error {
                item_id: self.id().to_string(),
                message,
                recoverable: true,
            });
            return;
        }

        if status.did_just_finish {
            let handle = core.handle.take();
            core.phase = PlayerPhase::Idle;
            core.status.is_playing = false;
            core.status.position_secs = 0.0;
            if let Some(duration) = status.duration_millis {
                core.status.duration_secs = Some(millis_to_secs(duration));
            }
            drop(core);

            if let Some(handle) = handle {
                self.unload_quietly(&handle);
            }
            self.release_active();

            info!(item_id = %self.id(), "Playback completed");
            self.emit(PlaybackEvent::Completed {
                item_id: self.id().to_string(),
            });
            return;
        }

        if let Some(duration) = status.duration_millis {
            core.status.duration_secs = Some(millis_to_secs(duration));
        }

        // Ticks are delivered asynchronously; one emitted before a pause or
        // preemption may land after it. Only a playing player follows them.
        if core.phase == PlayerPhase::Playing {
            core.status.position_secs = millis_to_secs(status.position_millis);
            core.status.is_playing = status.is_playing;
        }
    }

    fn send_read_receipt(&self) {
        let Some(sink) = self.context.read_receipts.clone() else {
            return;
        };
        let item_id = self.id().to_string();

        tokio::spawn(async move {
            if let Err(e) = sink.mark_listened(&item_id).await {
                debug!(item_id = %item_id, error = %e, "Read receipt failed");
            }
        });
    }
}

/// Playback controller for one mounted message.
///
/// Mounting registers a stop callback with the session registry. Dropping the
/// player unmounts it: the active id is released, the sound is unloaded and
/// the registration removed.
pub struct MessagePlayer {
    inner: Arc<PlayerInner>,
}

impl MessagePlayer {
    pub fn mount(item: PlayableItem, context: PlayerContext) -> Self {
        let registry = context.registry.clone();
        let id = item.id.clone();

        let inner = Arc::new_cyclic(|weak: &Weak<PlayerInner>| {
            let weak = weak.clone();
            let registration = registry.register(
                id.clone(),
                Arc::new(move || {
                    if let Some(player) = weak.upgrade() {
                        player.on_stop();
                    }
                }),
            );

            PlayerInner {
                item,
                context,
                core: Mutex::new(PlayerCore {
                    phase: PlayerPhase::Idle,
                    status: PlayerStatus::default(),
                    handle: None,
                    handle_generation: 0,
                    last_error: None,
                }),
                load_in_flight: AtomicBool::new(false),
                load_finished: Notify::new(),
                mounted: AtomicBool::new(true),
                generation: AtomicU64::new(0),
                registration: Mutex::new(Some(registration)),
            }
        });

        debug!(item_id = %id, "Player mounted");
        Self { inner }
    }

    pub fn id(&self) -> &ItemId {
        self.inner.id()
    }

    pub fn item(&self) -> &PlayableItem {
        &self.inner.item
    }

    /// Routes output, makes this message the only active one, loads the
    /// sound if needed and starts playing.
    ///
    /// Loading failures move the player to `Errored`, emit an eviction event
    /// and are returned. A call made while a load is already running returns
    /// `Ok(())` without loading again.
    pub async fn play(&self) -> Result<()> {
        self.inner.play().await
    }

    pub fn pause(&self) -> Result<()> {
        self.inner.pause()
    }

    /// Moves the playhead. Negative and non-finite positions clamp to zero.
    pub fn seek(&self, position_secs: f64) -> Result<()> {
        self.inner.seek(position_secs)
    }

    /// Unloads the sound and returns to `Idle`.
    pub fn reset(&self) {
        self.inner.reset()
    }

    /// Clears an error and plays again. No-op unless `Errored`.
    pub async fn retry(&self) -> Result<()> {
        {
            let mut core = self.inner.core.lock();
            if core.phase != PlayerPhase::Errored {
                return Ok(());
            }
            core.phase = PlayerPhase::Idle;
            core.status.has_error = false;
            core.last_error = None;
        }
        info!(item_id = %self.id(), "Retrying playback");
        self.inner.play().await
    }

    /// Loads the sound without playing it.
    pub async fn preload(&self) -> Result<()> {
        if !self.inner.is_mounted() {
            return Err(PlaybackError::NotMounted);
        }
        if self.inner.core.lock().phase != PlayerPhase::Idle {
            return Ok(());
        }
        self.inner.load().await.map(|_| ())
    }

    /// Starts [`preload`](Self::preload) on the current tokio runtime.
    ///
    /// Returns `false` when called outside a runtime.
    pub fn spawn_preload(&self) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(item_id = %self.id(), "No runtime available for preload");
            return false;
        };

        let inner = self.inner.clone();
        runtime.spawn(async move {
            if inner.core.lock().phase != PlayerPhase::Idle {
                return;
            }
            if let Err(e) = inner.load().await {
                debug!(item_id = %inner.id(), error = %e, "Preload failed");
            }
        });
        true
    }

    /// Tears the player down. Idempotent; also runs on drop.
    pub fn unmount(&self) {
        self.inner.unmount()
    }

    pub fn phase(&self) -> PlayerPhase {
        self.inner.core.lock().phase
    }

    pub fn status(&self) -> PlayerStatus {
        self.inner.core.lock().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.core.lock().last_error.clone()
    }

    pub fn has_handle(&self) -> bool {
        self.inner.core.lock().handle.is_some()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    /// Total length as `m:ss`, using the nominal length until one is known.
    pub fn display_duration(&self) -> String {
        display_duration(self.status().duration_secs, self.inner.item.nominal_duration_ms)
    }

    /// Current position as `m:ss`.
    pub fn display_position(&self) -> String {
        format_duration(self.status().position_secs)
    }
}

impl Drop for MessagePlayer {
    fn drop(&mut self) {
        self.inner.unmount();
    }
}

impl std::fmt::Debug for MessagePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("MessagePlayer")
            .field("id", self.id())
            .field("phase", &core.phase)
            .field("status", &core.status)
            .field("mounted", &self.inner.is_mounted())
            .finish()
    }
}
