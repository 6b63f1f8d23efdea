//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `SettingsStore` using a SQLite-backed key-value store
//! - `ReadReceiptSink` posting to an HTTP endpoint with `reqwest`
//! - `AudioEnvironment` / `AudioRouteConfigurator` shims (desktop has no
//!   earpiece or silent switch)
//!
//! Desktop has no native sound engine binding here; hosts inject their own
//! `SoundFactory`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopAudioEnvironment, DesktopRouteConfigurator, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = SqliteSettingsStore::new("~/.eleven/settings.db".into()).await?;
//!     let environment = DesktopAudioEnvironment::new();
//!     let configurator = DesktopRouteConfigurator::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod receipts;
mod route;
mod settings;

pub use receipts::{HttpReadReceipts, ITEM_ID_PLACEHOLDER};
pub use route::{DesktopAudioEnvironment, DesktopRouteConfigurator};
pub use settings::SqliteSettingsStore;
