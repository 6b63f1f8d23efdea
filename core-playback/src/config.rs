//! # Player Configuration
//!
//! Configuration and state types shared by the loader and message players.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy used by the audio loader.
///
/// Before attempt `k + 1` the loader waits `base_delay * 2^(k - 1)`, capped at
/// `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    ///
    /// Default: 3.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failure.
    ///
    /// Default: 1 second.
    #[serde(default = "default_base_delay")]
    pub base_delay: Duration,

    /// Upper bound for any single delay.
    ///
    /// Default: 8 seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Validate policy values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be > 0".to_string());
        }

        if self.base_delay > self.max_delay {
            return Err("base_delay cannot exceed max_delay".to_string());
        }

        Ok(())
    }
}

/// Per-session player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Loader retry policy.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Load the sound as soon as a player is mounted instead of on first play.
    ///
    /// Default: false.
    #[serde(default)]
    pub preload_on_mount: bool,

    /// How often hosts push status ticks while playing.
    ///
    /// Default: 250ms.
    #[serde(default = "default_progress_update_interval")]
    pub progress_update_interval: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            preload_on_mount: false,
            progress_update_interval: default_progress_update_interval(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.retry.validate()?;

        if self.progress_update_interval.is_zero() {
            return Err("progress_update_interval must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(8)
}

fn default_progress_update_interval() -> Duration {
    Duration::from_millis(250)
}

// ============================================================================
// Player State
// ============================================================================

/// Lifecycle phase of a message player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPhase {
    /// No handle held.
    Idle,
    /// A load is in progress.
    Loading,
    /// Handle loaded, not rendering audio.
    ReadyPaused,
    /// Handle loaded and playing.
    Playing,
    /// Load or playback failed. Left only through retry.
    Errored,
}

impl PlayerPhase {
    /// Returns `true` if a loaded handle is expected in this phase.
    pub fn has_handle(&self) -> bool {
        matches!(self, Self::ReadyPaused | Self::Playing)
    }
}

/// UI-facing snapshot of a player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub is_loading: bool,
    pub is_playing: bool,
    pub has_error: bool,
    pub position_secs: f64,
    /// Known once the host reported a duration.
    pub duration_secs: Option<f64>,
}
