//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host (iOS, Android, desktop) must
//! implement for the voice-message playback core.
//!
//! ## Overview
//!
//! The core never touches a platform audio API directly. Each trait below is a
//! capability the core needs but that is implemented differently per platform.
//!
//! ## Traits
//!
//! ### Audio
//! - [`SoundFactory`](audio::SoundFactory) - Create loaded sound handles from a source
//! - [`SoundHandle`](audio::SoundHandle) - Play/pause/seek/unload one loaded sound
//! - [`SoundStatusObserver`](audio::SoundStatusObserver) - Push channel for status ticks
//!
//! ### Routing
//! - [`AudioRouteConfigurator`](route::AudioRouteConfigurator) - Apply audio-session configuration
//! - [`AudioEnvironment`](route::AudioEnvironment) - External device and silent-switch probes
//!
//! ### Storage & Network
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//! - [`ReadReceiptSink`](receipts::ReadReceiptSink) - Best-effort "listened" notifications
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Settings, receipts, routing |
//! | iOS      | host app            | 📋 Injected |
//! | Android  | host app            | 📋 Injected |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`. Status observers in particular may
//! be invoked from a native audio thread.

pub mod audio;
pub mod error;
pub mod logging;
pub mod receipts;
pub mod route;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{
    AudioSource, SoundFactory, SoundHandle, SoundOptions, SoundStatus, SoundStatusObserver,
};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use receipts::ReadReceiptSink;
pub use route::{
    AudioEnvironment, AudioRouteConfigurator, InterruptionMode, RouteConfig, RouteMode,
};
pub use storage::SettingsStore;
