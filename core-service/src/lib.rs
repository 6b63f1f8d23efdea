//! Playback service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (sound factory,
//! routing, settings, read receipts) into one playback session: a single
//! registry, output router, loader and event bus shared by every mounted
//! message player. Desktop apps typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) to get default routing and settings
//! bridges.

pub mod error;

pub use error::{CoreError, Result};

pub use core_playback::{
    ItemId, MessagePlayer, PlayableItem, PlaybackError, PlayerConfig, PlayerPhase, PlayerStatus,
    RetryPolicy, RoutePreference,
};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaybackEvent, RouteEvent};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use core_playback::{AudioLoader, OutputRouter, PlaybackRegistry, PlayerContext};
use core_runtime::events::DEFAULT_EVENT_BUFFER_SIZE;
use tracing::{debug, info};

#[cfg(feature = "desktop-shims")]
use std::path::PathBuf;

struct ServiceInner {
    config: CoreConfig,
    player_config: PlayerConfig,
    events: EventBus,
    registry: Arc<PlaybackRegistry>,
    router: Arc<OutputRouter>,
    loader: AudioLoader,
    shut_down: AtomicBool,
}

/// Primary façade exposed to host applications.
///
/// One service corresponds to one playback session (typically one chat
/// screen). Cloning is cheap and shares the session.
#[derive(Clone)]
pub struct PlaybackService {
    inner: Arc<ServiceInner>,
}

impl PlaybackService {
    /// Create a new session from the provided configuration.
    pub fn new(config: CoreConfig, player_config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        player_config
            .validate()
            .map_err(CoreError::InvalidConfig)?;

        let events = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);
        let registry = PlaybackRegistry::new();
        let router = Arc::new(
            OutputRouter::new(
                config.route_configurator.clone(),
                config.audio_environment.clone(),
                config.settings_store.clone(),
                events.clone(),
            )
            .with_silent_mode_routing(config.features.enable_silent_mode_routing),
        );
        let loader = AudioLoader::new(config.sound_factory.clone(), &player_config);

        info!(
            read_receipts = config.features.enable_read_receipts,
            preload_on_mount = player_config.preload_on_mount,
            "Playback service created"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                player_config,
                events,
                registry,
                router,
                loader,
                shut_down: AtomicBool::new(false),
            }),
        })
    }

    /// Event bus carrying playback and route events for this session.
    pub fn events(&self) -> EventBus {
        self.inner.events.clone()
    }

    /// Subscribe to all session events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    pub fn registry(&self) -> Arc<PlaybackRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn router(&self) -> Arc<OutputRouter> {
        Arc::clone(&self.inner.router)
    }

    pub fn player_config(&self) -> &PlayerConfig {
        &self.inner.player_config
    }

    /// Access the bridge configuration being used by the service.
    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    fn player_context(&self) -> PlayerContext {
        PlayerContext {
            registry: self.registry(),
            router: self.router(),
            loader: self.inner.loader.clone(),
            events: self.events(),
            read_receipts: self.inner.config.active_read_receipts(),
        }
    }

    /// Mount a player for a visible message.
    ///
    /// The returned player unmounts itself when dropped.
    pub fn mount(&self, item: PlayableItem) -> Result<MessagePlayer> {
        if self.is_shut_down() {
            return Err(CoreError::ShutDown);
        }

        let player = MessagePlayer::mount(item, self.player_context());
        if self.inner.player_config.preload_on_mount && !player.spawn_preload() {
            debug!(item_id = %player.id(), "Preload skipped outside a runtime");
        }
        Ok(player)
    }

    /// Persist (or clear) the user's preferred output.
    pub async fn set_output_preference(&self, preference: Option<RoutePreference>) -> Result<()> {
        self.inner.router.set_preference(preference).await?;
        Ok(())
    }

    pub async fn output_preference(&self) -> Option<RoutePreference> {
        self.inner.router.preference().await
    }

    /// Stop every mounted player.
    pub fn stop_all(&self) {
        self.inner.registry.stop_all();
    }

    /// Stop everything and drop all registrations. Further mounts fail.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.registry.cleanup();
        info!("Playback service shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PlaybackService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackService")
            .field("registry", &self.inner.registry)
            .field("router", &self.inner.router)
            .field("player_config", &self.inner.player_config)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the desktop routing shims and a SQLite settings database at
/// `settings_path`; the host still provides the sound factory.
///
/// ```ignore
/// use core_service::{bootstrap_desktop, PlayerConfig};
///
/// let service = bootstrap_desktop(Arc::new(MyRodioFactory::new()), "settings.db", PlayerConfig::default())?;
/// let player = service.mount(PlayableItem::new("msg-1", "https://cdn.example.com/1.m4a", 4_000))?;
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    sound_factory: Arc<dyn bridge_traits::SoundFactory>,
    settings_path: impl Into<PathBuf>,
    player_config: PlayerConfig,
) -> Result<PlaybackService> {
    let config = CoreConfig::builder()
        .sound_factory(sound_factory)
        .settings_path(settings_path)
        .build()?;
    PlaybackService::new(config, player_config)
}
