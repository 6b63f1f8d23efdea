//! Audio Output Routing Abstractions
//!
//! The host decides physically where audio goes (loudspeaker, earpiece,
//! Bluetooth/wired headset). The core only describes the session it wants
//! through [`RouteConfig`] and asks [`AudioEnvironment`] about the current
//! device situation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Physical output path selected for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Speaker,
    Earpiece,
    /// Headset, Bluetooth or other external device.
    External,
}

impl RouteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMode::Speaker => "speaker",
            RouteMode::Earpiece => "earpiece",
            RouteMode::External => "external",
        }
    }
}

impl std::fmt::Display for RouteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the app's audio session interacts with other apps' audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionMode {
    /// Other audio is stopped while we play.
    DoNotMix,
    /// Other audio keeps playing at a lowered volume.
    DuckOthers,
    /// Other audio keeps playing unchanged.
    MixWithOthers,
}

/// Platform audio-session toggles applied before playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Keep the session active while the app is backgrounded.
    pub stays_active_in_background: bool,
    /// Ignore the hardware silent switch.
    pub plays_in_silent_mode: bool,
    /// Lower other apps' audio instead of stopping it.
    pub should_duck_others: bool,
    /// Route output through the earpiece receiver instead of the speaker.
    pub play_through_earpiece: bool,
    /// Interruption behaviour.
    pub interruption_mode: InterruptionMode,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            stays_active_in_background: false,
            plays_in_silent_mode: true,
            should_duck_others: true,
            play_through_earpiece: false,
            interruption_mode: InterruptionMode::DoNotMix,
        }
    }
}

/// Applies audio-session configuration on the host.
///
/// - **iOS**: `AVAudioSession` category/options
/// - **Android**: `AudioManager` mode and speakerphone flag
/// - **Desktop**: usually a no-op
#[async_trait]
pub trait AudioRouteConfigurator: Send + Sync {
    async fn apply_route_config(&self, config: RouteConfig) -> Result<()>;
}

/// Read-only view of the device's audio environment.
///
/// Both queries are evaluated fresh on every call because headsets can be
/// plugged in and the silent switch toggled between two plays.
#[async_trait]
pub trait AudioEnvironment: Send + Sync {
    /// Whether a headset, Bluetooth device or other external output is
    /// currently connected.
    async fn has_external_output(&self) -> Result<bool>;

    /// Whether the device's ringer/silent switch is in silent position.
    async fn is_silent_mode(&self) -> Result<bool>;
}
