//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Configuration management with fail-fast capability checks
//! - Event bus carrying playback and routing events to the UI
//!
//! ## Overview
//!
//! This crate contains the runtime utilities every other core crate depends
//! on. It establishes logging conventions and the broadcast channel through
//! which players report state changes and evictions to the hosting list.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
