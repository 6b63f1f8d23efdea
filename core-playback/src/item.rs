//! Playable item identity and metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a playable message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Message metadata supplied by the hosting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableItem {
    pub id: ItemId,
    /// Audio URL (http, https or file).
    pub source_ref: String,
    /// Length advertised by the message API, used until the host reports one.
    pub nominal_duration_ms: u64,
}

impl PlayableItem {
    pub fn new(
        id: impl Into<ItemId>,
        source_ref: impl Into<String>,
        nominal_duration_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            source_ref: source_ref.into(),
            nominal_duration_ms,
        }
    }
}
