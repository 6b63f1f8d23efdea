//! Sound handle bridge traits and supporting audio types.
//!
//! A platform audio engine exposes one loaded sound per [`SoundHandle`].
//! Handles are produced by a [`SoundFactory`] and report progress through a
//! single [`SoundStatusObserver`] supplied at creation time. Creation is
//! async (it usually involves a network fetch); transport commands are
//! synchronous dispatches into the native player, mirroring sink-style
//! audio APIs where `pause()` returns as soon as the command is issued.

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Location of the audio a sound handle should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Remote HTTP(S) resource fetched by the host.
    RemoteStream { url: String },
    /// File already present on the device.
    LocalFile { path: PathBuf },
}

impl AudioSource {
    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::RemoteStream { .. })
    }

    /// Render the source back into a URI-like string for logging and hosts
    /// that only accept strings.
    pub fn uri(&self) -> String {
        match self {
            AudioSource::RemoteStream { url } => url.clone(),
            AudioSource::LocalFile { path } => format!("file://{}", path.display()),
        }
    }
}

/// Options applied when a sound is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundOptions {
    /// Start playing immediately after loading. The core always loads paused
    /// and issues `play()` itself once routing and exclusivity are settled.
    pub should_play: bool,
    /// Initial volume (0.0 = muted, 1.0 = unity gain).
    pub volume: f32,
    /// How often the host should push status updates while playing.
    pub progress_update_interval: Duration,
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self {
            should_play: false,
            volume: 1.0,
            progress_update_interval: Duration::from_millis(250),
        }
    }
}

/// Snapshot of a sound's state, pushed by the host on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoundStatus {
    /// Whether the native resource is loaded and controllable.
    pub is_loaded: bool,
    /// Whether audio is currently being rendered.
    pub is_playing: bool,
    /// Playback position in milliseconds.
    pub position_millis: u64,
    /// Total duration in milliseconds, once known.
    pub duration_millis: Option<u64>,
    /// Set exactly once when playback reaches the natural end.
    pub did_just_finish: bool,
    /// Host-reported failure for this sound.
    pub error: Option<String>,
}

impl SoundStatus {
    /// Status of a loaded sound at the given position.
    pub fn loaded(position_millis: u64, duration_millis: Option<u64>) -> Self {
        Self {
            is_loaded: true,
            position_millis,
            duration_millis,
            ..Default::default()
        }
    }

    /// Mark the status as actively playing.
    pub fn playing(mut self) -> Self {
        self.is_playing = true;
        self
    }

    /// Status reported when playback reached the end of the stream.
    pub fn finished(duration_millis: u64) -> Self {
        Self {
            is_loaded: true,
            is_playing: false,
            position_millis: duration_millis,
            duration_millis: Some(duration_millis),
            did_just_finish: true,
            error: None,
        }
    }

    /// Status reported when the host hit an unrecoverable error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Receiver for status updates of a single sound.
///
/// Hosts call [`on_status`](SoundStatusObserver::on_status) from whatever
/// thread their audio engine uses; implementations must not block.
pub trait SoundStatusObserver: Send + Sync {
    fn on_status(&self, status: SoundStatus);
}

/// One loaded audio resource.
pub trait SoundHandle: Send + Sync {
    /// Begin or resume playback.
    fn play(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    fn pause(&self) -> Result<()>;

    /// Move the playhead to an absolute position.
    fn seek(&self, position: Duration) -> Result<()>;

    /// Release the native resource. The handle is unusable afterwards.
    fn unload(&self) -> Result<()>;

    /// Latest known status.
    fn status(&self) -> SoundStatus;
}

/// Creates sound handles for a source.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::audio::{AudioSource, SoundFactory, SoundOptions};
///
/// async fn open(factory: &dyn SoundFactory, observer: Arc<dyn SoundStatusObserver>) -> Result<()> {
///     let source = AudioSource::RemoteStream { url: "https://cdn.example.com/a.m4a".into() };
///     let handle = factory.create(&source, SoundOptions::default(), observer).await?;
///     handle.play()?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SoundFactory: Send + Sync {
    /// Create and load a new sound. Each call yields an independent handle.
    async fn create(
        &self,
        source: &AudioSource,
        options: SoundOptions,
        observer: Arc<dyn SoundStatusObserver>,
    ) -> Result<Box<dyn SoundHandle>>;
}
