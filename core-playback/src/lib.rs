//! # Voice Message Playback Core
//!
//! Coordinates playback of voice messages in a scrolling list.
//!
//! ## Overview
//!
//! - [`loader::AudioLoader`] - validated sound creation with retry and backoff
//! - [`router::OutputRouter`] - speaker / earpiece / external routing before each play
//! - [`registry::PlaybackRegistry`] - at most one message plays at a time
//! - [`player::MessagePlayer`] - per-message state machine
//!
//! Platform audio is reached only through the `bridge-traits` contracts; the
//! host injects a [`bridge_traits::SoundFactory`] and friends.

pub mod config;
pub mod error;
pub mod format;
pub mod item;
pub mod loader;
pub mod player;
pub mod registry;
pub mod router;
pub mod source;

pub use config::{PlayerConfig, PlayerPhase, PlayerStatus, RetryPolicy};
pub use error::{PlaybackError, Result};
pub use format::{display_duration, format_duration};
pub use item::{ItemId, PlayableItem};
pub use loader::AudioLoader;
pub use player::{MessagePlayer, PlayerContext};
pub use registry::{PlaybackRegistry, Registration, StopCallback};
pub use router::{OutputRouter, RouteEnvironment, RoutePreference, OUTPUT_PREFERENCE_KEY};
pub use source::is_valid_audio_url;
