//! Desktop audio routing shims
//!
//! Desktop machines have no earpiece receiver or silent switch; output goes to
//! whatever device the OS mixer selected. The configurator records what the
//! core asked for so hosts can inspect it.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    route::{AudioEnvironment, AudioRouteConfigurator, RouteConfig},
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Audio environment for desktop hosts.
///
/// Reports no external output unless the host says otherwise (e.g. after
/// detecting a headset through its own device APIs). Never silent.
#[derive(Debug, Default)]
pub struct DesktopAudioEnvironment {
    external_output: AtomicBool,
}

impl DesktopAudioEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether a headset or Bluetooth device is connected.
    pub fn set_external_output(&self, connected: bool) {
        self.external_output.store(connected, Ordering::Relaxed);
    }
}

#[async_trait]
impl AudioEnvironment for DesktopAudioEnvironment {
    async fn has_external_output(&self) -> Result<bool> {
        Ok(self.external_output.load(Ordering::Relaxed))
    }

    async fn is_silent_mode(&self) -> Result<bool> {
        Ok(false)
    }
}

/// Route configurator for desktop hosts. Accepts every configuration.
#[derive(Debug, Default)]
pub struct DesktopRouteConfigurator {
    last_applied: RwLock<Option<RouteConfig>>,
}

impl DesktopRouteConfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent configuration requested by the core.
    pub fn last_applied(&self) -> Option<RouteConfig> {
        *self.last_applied.read()
    }
}

#[async_trait]
impl AudioRouteConfigurator for DesktopRouteConfigurator {
    async fn apply_route_config(&self, config: RouteConfig) -> Result<()> {
        if config.play_through_earpiece {
            debug!("No earpiece on desktop; using the default output device");
        }
        *self.last_applied.write() = Some(config);
        Ok(())
    }
}
