//! # Core Configuration Module
//!
//! Builder-based configuration holding every bridge the playback core needs.
//!
//! ## Required Dependencies
//!
//! - `SoundFactory` - Creates platform sound handles
//! - `SettingsStore` - Persists the output-route preference
//! - `AudioRouteConfigurator` - Applies audio-session configuration
//! - `AudioEnvironment` - Reports external devices and the silent switch
//!
//! ## Optional Dependencies
//!
//! - `ReadReceiptSink` - Marks messages as listened (required when
//!   `enable_read_receipts` is set)
//! - `LoggerSink` - Host log forwarding, handed to [`crate::logging::LoggingConfig`]
//!
//! With the `desktop-shims` feature, desktop defaults are injected for the
//! route configurator, the audio environment and (when `settings_path` is set)
//! a SQLite settings store.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .sound_factory(Arc::new(MySoundFactory))
//!     .settings_store(Arc::new(MySettings))
//!     .route_configurator(Arc::new(MyRouteConfigurator))
//!     .audio_environment(Arc::new(MyEnvironment))
//!     .read_receipts(Arc::new(MyReceipts))
//!     .enable_read_receipts(true)
//!     .build()?;
//! ```
//!
//! Missing capabilities fail fast with [`Error::CapabilityMissing`] and a
//! message describing how each platform is expected to provide them.

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{
    AudioEnvironment, AudioRouteConfigurator, LoggerSink, ReadReceiptSink, SettingsStore,
    SoundFactory,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Platform sound factory (required)
    pub sound_factory: Arc<dyn SoundFactory>,

    /// User preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Audio-session configurator (required, desktop default available)
    pub route_configurator: Arc<dyn AudioRouteConfigurator>,

    /// Device audio environment probe (required, desktop default available)
    pub audio_environment: Arc<dyn AudioEnvironment>,

    /// Read-receipt channel (optional)
    pub read_receipts: Option<Arc<dyn ReadReceiptSink>>,

    /// Host log sink (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("sound_factory", &"SoundFactory { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("route_configurator", &"AudioRouteConfigurator { ... }")
            .field("audio_environment", &"AudioEnvironment { ... }")
            .field(
                "read_receipts",
                &self.read_receipts.as_ref().map(|_| "ReadReceiptSink { ... }"),
            )
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Send a read receipt when a message starts playing
    pub enable_read_receipts: bool,

    /// Route to the earpiece while the silent switch is on
    pub enable_silent_mode_routing: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_read_receipts: false,
            enable_silent_mode_routing: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates feature flags against the provided bridges.
    pub fn validate(&self) -> Result<()> {
        if self.features.enable_read_receipts && self.read_receipts.is_none() {
            return Err(Error::Config(
                "Read receipts enabled but no ReadReceiptSink provided. \
                 Disable the feature or inject a ReadReceiptSink implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Logging configuration forwarding to the host sink when one was given.
    pub fn logging_config(&self) -> LoggingConfig {
        match &self.logger_sink {
            Some(sink) => LoggingConfig::default().with_logger_sink(sink.clone()),
            None => LoggingConfig::default(),
        }
    }

    /// Read-receipt sink, if receipts are enabled.
    pub fn active_read_receipts(&self) -> Option<Arc<dyn ReadReceiptSink>> {
        if self.features.enable_read_receipts {
            self.read_receipts.clone()
        } else {
            None
        }
    }
}

fn sound_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SoundFactory".to_string(),
        message: "SoundFactory implementation is required to load voice messages. \
                 iOS/Android: inject the host's native player bridge. \
                 Tests: inject an in-memory fake."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the output preference. \
                 Desktop: enable the 'desktop-shims' feature and set settings_path. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn route_configurator_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioRouteConfigurator".to_string(),
        message: "AudioRouteConfigurator implementation is required before playback. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject the AVAudioSession/AudioManager bridge."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn audio_environment_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioEnvironment".to_string(),
        message: "AudioEnvironment implementation is required for output routing. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject a bridge reporting headsets and the silent switch."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_route_configurator() -> Result<Arc<dyn AudioRouteConfigurator>> {
    Ok(Arc::new(bridge_desktop::DesktopRouteConfigurator::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_route_configurator() -> Result<Arc<dyn AudioRouteConfigurator>> {
    Err(route_configurator_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_audio_environment() -> Result<Arc<dyn AudioEnvironment>> {
    Ok(Arc::new(bridge_desktop::DesktopAudioEnvironment::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_audio_environment() -> Result<Arc<dyn AudioEnvironment>> {
    Err(audio_environment_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(settings_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let path = settings_path.ok_or_else(|| Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "No SettingsStore provided and no settings_path set for the desktop default. \
                 Call settings_path(..) or inject a SettingsStore."
            .to_string(),
    })?;

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread().enable_all().build().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| Error::Internal(format!("Failed to initialize default SettingsStore: {}", e)))
    };

    // block_on panics inside a runtime, so hop to a plain thread when needed.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_settings_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    sound_factory: Option<Arc<dyn SoundFactory>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    settings_path: Option<PathBuf>,
    route_configurator: Option<Arc<dyn AudioRouteConfigurator>>,
    audio_environment: Option<Arc<dyn AudioEnvironment>>,
    read_receipts: Option<Arc<dyn ReadReceiptSink>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    pub fn sound_factory(mut self, factory: Arc<dyn SoundFactory>) -> Self {
        self.sound_factory = Some(factory);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Location of the desktop default settings database. Ignored when a
    /// settings store is injected.
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn route_configurator(mut self, configurator: Arc<dyn AudioRouteConfigurator>) -> Self {
        self.route_configurator = Some(configurator);
        self
    }

    pub fn audio_environment(mut self, environment: Arc<dyn AudioEnvironment>) -> Self {
        self.audio_environment = Some(environment);
        self
    }

    pub fn read_receipts(mut self, sink: Arc<dyn ReadReceiptSink>) -> Self {
        self.read_receipts = Some(sink);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn enable_read_receipts(mut self, enable: bool) -> Self {
        self.features.enable_read_receipts = enable;
        self
    }

    pub fn enable_silent_mode_routing(mut self, enable: bool) -> Self {
        self.features.enable_silent_mode_routing = enable;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   platform default is available
    /// - [`Error::Config`] when feature flags need a bridge that was not given
    pub fn build(self) -> Result<CoreConfig> {
        let sound_factory = self.sound_factory.ok_or_else(sound_factory_missing_error)?;

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let route_configurator = match self.route_configurator {
            Some(configurator) => configurator,
            None => provide_default_route_configurator()?,
        };

        let audio_environment = match self.audio_environment {
            Some(environment) => environment,
            None => provide_default_audio_environment()?,
        };

        let config = CoreConfig {
            sound_factory,
            settings_store,
            route_configurator,
            audio_environment,
            read_receipts: self.read_receipts,
            logger_sink: self.logger_sink,
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}
