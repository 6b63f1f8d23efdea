//! Workspace entry crate.
//!
//! Exposes the playback façade behind the `desktop-shims` feature so host
//! applications can depend on a single crate instead of wiring
//! `core-service`, `core-playback` and the bridges individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
