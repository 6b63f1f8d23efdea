//! # Output Router
//!
//! Decides whether a message plays through the speaker, the earpiece or an
//! external device, and applies the matching audio-session configuration
//! before every playback start.
//!
//! ## Decision Order
//!
//! 1. A connected headset or Bluetooth device always wins (`External`).
//! 2. Silent mode or a persisted earpiece preference selects `Earpiece`.
//! 3. Otherwise `Speaker`.
//!
//! Probe and settings failures count as "no device / not silent / no
//! preference". Configuration failures fall back to the speaker preset and
//! are never returned to callers.

use bridge_traits::{
    AudioEnvironment, AudioRouteConfigurator, InterruptionMode, RouteConfig, RouteMode,
    SettingsStore,
};
use core_runtime::events::{EventBus, RouteEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};

/// Settings key holding the user's output preference.
pub const OUTPUT_PREFERENCE_KEY: &str = "playback.output_preference";

/// Output the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    Speaker,
    Earpiece,
}

impl RoutePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePreference::Speaker => "speaker",
            RoutePreference::Earpiece => "earpiece",
        }
    }

    /// Parses a persisted value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "speaker" => Some(RoutePreference::Speaker),
            "earpiece" => Some(RoutePreference::Earpiece),
            _ => None,
        }
    }
}

/// Snapshot of everything the routing decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteEnvironment {
    pub has_external_device: bool,
    pub is_silent_mode: bool,
    pub preference: Option<RoutePreference>,
}

/// Pure routing decision.
pub fn resolve_route(env: &RouteEnvironment) -> RouteMode {
    if env.has_external_device {
        RouteMode::External
    } else if env.is_silent_mode || env.preference == Some(RoutePreference::Earpiece) {
        RouteMode::Earpiece
    } else {
        RouteMode::Speaker
    }
}

/// Audio-session preset for a route.
pub fn route_config_for(mode: RouteMode) -> RouteConfig {
    let speaker = RouteConfig {
        stays_active_in_background: false,
        plays_in_silent_mode: true,
        should_duck_others: true,
        play_through_earpiece: false,
        interruption_mode: InterruptionMode::DoNotMix,
    };

    match mode {
        RouteMode::Speaker => speaker,
        RouteMode::Earpiece => RouteConfig {
            play_through_earpiece: true,
            ..speaker
        },
        RouteMode::External => RouteConfig {
            interruption_mode: InterruptionMode::DuckOthers,
            ..speaker
        },
    }
}

/// Applies output routing through the platform bridges.
pub struct OutputRouter {
    configurator: Arc<dyn AudioRouteConfigurator>,
    environment: Arc<dyn AudioEnvironment>,
    settings: Arc<dyn SettingsStore>,
    events: EventBus,
    silent_mode_routing: bool,
    current_mode: RwLock<Option<RouteMode>>,
}

impl OutputRouter {
    pub fn new(
        configurator: Arc<dyn AudioRouteConfigurator>,
        environment: Arc<dyn AudioEnvironment>,
        settings: Arc<dyn SettingsStore>,
        events: EventBus,
    ) -> Self {
        Self {
            configurator,
            environment,
            settings,
            events,
            silent_mode_routing: true,
            current_mode: RwLock::new(None),
        }
    }

    /// Whether the silent switch should move playback to the earpiece.
    pub fn with_silent_mode_routing(mut self, enabled: bool) -> Self {
        self.silent_mode_routing = enabled;
        self
    }

    /// Last successfully applied mode, if any.
    pub fn current_mode(&self) -> Option<RouteMode> {
        *self.current_mode.read()
    }

    /// Reads the persisted preference. Storage failures read as `None`.
    pub async fn preference(&self) -> Option<RoutePreference> {
        match self.settings.get_string(OUTPUT_PREFERENCE_KEY).await {
            Ok(Some(value)) => {
                let preference = RoutePreference::parse(&value);
                if preference.is_none() {
                    debug!(value = %value, "Ignoring unknown output preference");
                }
                preference
            }
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Failed to read output preference");
                None
            }
        }
    }

    /// Persists the preference, or clears it with `None`.
    pub async fn set_preference(&self, preference: Option<RoutePreference>) -> Result<()> {
        match preference {
            Some(preference) => {
                self.settings
                    .set_string(OUTPUT_PREFERENCE_KEY, preference.as_str())
                    .await?
            }
            None => self.settings.delete(OUTPUT_PREFERENCE_KEY).await?,
        }

        info!(preference = ?preference, "Output preference updated");
        Ok(())
    }

    /// Probes the device environment and the persisted preference.
    pub async fn probe(&self) -> RouteEnvironment {
        let has_external_device = self
            .environment
            .has_external_output()
            .await
            .unwrap_or_else(|e| {
                debug!(error = %e, "External output probe failed");
                false
            });

        let is_silent_mode = if self.silent_mode_routing {
            self.environment.is_silent_mode().await.unwrap_or_else(|e| {
                debug!(error = %e, "Silent mode probe failed");
                false
            })
        } else {
            false
        };

        RouteEnvironment {
            has_external_device,
            is_silent_mode,
            preference: self.preference().await,
        }
    }

    /// Resolves and applies the route for an upcoming playback.
    ///
    /// Never fails. If the resolved preset cannot be applied the speaker
    /// preset is tried; if that fails too the previous mode is kept.
    pub async fn configure_for_playback(&self) -> RouteMode {
        let env = self.probe().await;
        let desired = resolve_route(&env);
        debug!(mode = %desired, ?env, "Resolved output route");

        if self.apply(desired).await {
            return desired;
        }

        if desired != RouteMode::Speaker && self.apply(RouteMode::Speaker).await {
            return RouteMode::Speaker;
        }

        self.current_mode().unwrap_or(RouteMode::Speaker)
    }

    async fn apply(&self, mode: RouteMode) -> bool {
        match self.configurator.apply_route_config(route_config_for(mode)).await {
            Ok(()) => {
                let previous = self.current_mode.write().replace(mode);
                if previous != Some(mode) {
                    info!(mode = %mode, "Output route applied");
                    self.events.emit_route(RouteEvent::Changed { mode });
                }
                true
            }
            Err(e) => {
                let err = PlaybackError::RouteConfig(e.to_string());
                warn!(mode = %mode, error = %err, "Failed to apply output route");
                self.events.emit_route(RouteEvent::ConfigFailed {
                    message: err.to_string(),
                });
                false
            }
        }
    }
}

impl std::fmt::Debug for OutputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRouter")
            .field("silent_mode_routing", &self.silent_mode_routing)
            .field("current_mode", &self.current_mode())
            .finish()
    }
}
