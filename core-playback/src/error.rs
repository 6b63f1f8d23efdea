//! # Playback Error Types
//!
//! Error types for loading and controlling voice-message playback.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Source reference failed validation. Never retried.
    #[error("Invalid audio source: {0}")]
    InvalidSource(String),

    /// Every load attempt failed.
    #[error("Failed to load {source_ref} after {attempts} attempts: {last_error}")]
    LoadFailed {
        source_ref: String,
        attempts: u32,
        last_error: String,
    },

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// A play/pause/seek command on a loaded handle was rejected.
    /// The handle is presumed still usable.
    #[error("Playback command '{command}' failed: {message}")]
    CommandFailed {
        command: &'static str,
        message: String,
    },

    /// Applying the audio-session configuration failed.
    #[error("Route configuration failed: {0}")]
    RouteConfig(String),

    /// The player was unmounted while the operation was in progress.
    #[error("Player is no longer mounted")]
    NotMounted,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PlaybackError {
    /// Returns `true` if the hosting list should drop the item from view.
    pub fn is_evicting(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidSource(_) | PlaybackError::LoadFailed { .. }
        )
    }

    /// Returns `true` if this error is transient and surfaced only as a notice.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::CommandFailed { .. } | PlaybackError::RouteConfig(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_classification() {
        assert!(PlaybackError::InvalidSource("ftp://x".into()).is_evicting());
        assert!(PlaybackError::LoadFailed {
            source_ref: "https://a/b.m4a".into(),
            attempts: 3,
            last_error: "404".into(),
        }
        .is_evicting());
        assert!(!PlaybackError::NotMounted.is_evicting());
    }

    #[test]
    fn test_command_failure_is_transient() {
        let err = PlaybackError::CommandFailed {
            command: "play",
            message: "device busy".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_evicting());
        assert_eq!(
            err.to_string(),
            "Playback command 'play' failed: device busy"
        );
    }
}
