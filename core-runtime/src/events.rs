//! # Event Bus System
//!
//! Broadcasts playback and routing events from the core to the UI layer using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Message players never call back into the screen that hosts them. Instead
//! they emit typed events; the hosting list subscribes and reacts, e.g. by
//! dropping an item from view on [`PlaybackEvent::Evicted`] or showing a
//! dismissible notice on [`PlaybackEvent::Notice`].
//!
//! ```text
//! ┌──────────────┐  emit   ┌───────────┐  subscribe  ┌──────────────┐
//! │MessagePlayer ├────────>│           ├────────────>│ Message list │
//! └──────────────┘         │ EventBus  │             └──────────────┘
//! ┌──────────────┐  emit   │ (broadcast│  subscribe  ┌──────────────┐
//! │ OutputRouter ├────────>│  channel) ├────────────>│ Debug overlay│
//! └──────────────┘         └───────────┘             └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(32);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Started {
//!     item_id: "msg-1".to_string(),
//! }))
//! .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.item_id(), Some("msg-1"));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal.
//! - **`RecvError::Closed`**: every sender was dropped; the session ended.
//!
//! Emitting with no subscribers returns an error that producers in the core
//! deliberately ignore: a list that is not listening simply misses updates.

use bridge_traits::RouteMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position ticks are not broadcast, so traffic is a few events per user
/// gesture; 64 leaves ample headroom for a fast scroll through a list.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Per-message playback events
    Playback(PlaybackEvent),
    /// Output routing events
    Route(RouteEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Route(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Evicted { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Notice { .. }) => EventSeverity::Warning,
            CoreEvent::Route(RouteEvent::ConfigFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// The message the event refers to, if it is a playback event.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            CoreEvent::Playback(e) => Some(e.item_id()),
            CoreEvent::Route(_) => None,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by message players.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The message started (or resumed) playing.
    Started { item_id: String },
    /// The user paused the message.
    Paused {
        item_id: String,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Another message became active and this one was stopped.
    Preempted { item_id: String },
    /// The message played to its natural end.
    Completed { item_id: String },
    /// The message's audio could not be loaded; the list should drop it.
    Evicted {
        item_id: String,
        /// Human-readable reason, safe to log.
        reason: String,
    },
    /// A transient, dismissible problem (e.g. a pause command failed).
    Notice { item_id: String, message: String },
    /// The platform reported a failure for a loaded sound.
    Error {
        item_id: String,
        message: String,
        /// Whether an explicit retry may succeed.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Preempted { .. } => "Playback preempted by another message",
            PlaybackEvent::Completed { .. } => "Message completed",
            PlaybackEvent::Evicted { .. } => "Message evicted",
            PlaybackEvent::Notice { .. } => "Playback notice",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    /// The message this event refers to.
    pub fn item_id(&self) -> &str {
        match self {
            PlaybackEvent::Started { item_id }
            | PlaybackEvent::Paused { item_id, .. }
            | PlaybackEvent::Preempted { item_id }
            | PlaybackEvent::Completed { item_id }
            | PlaybackEvent::Evicted { item_id, .. }
            | PlaybackEvent::Notice { item_id, .. }
            | PlaybackEvent::Error { item_id, .. } => item_id,
        }
    }
}

// ============================================================================
// Route Events
// ============================================================================

/// Events emitted by the output router.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RouteEvent {
    /// A different output route was applied.
    Changed { mode: RouteMode },
    /// Applying route configuration failed; the previous route is kept.
    ConfigFailed { message: String },
}

impl RouteEvent {
    fn description(&self) -> &str {
        match self {
            RouteEvent::Changed { .. } => "Output route changed",
            RouteEvent::ConfigFailed { .. } => "Output route configuration failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; all clones publish to the same
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified per-subscriber buffer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Publishes a playback event, ignoring the no-subscriber case.
    pub fn emit_playback(&self, event: PlaybackEvent) {
        let _ = self.sender.send(CoreEvent::Playback(event));
    }

    /// Publishes a route event, ignoring the no-subscriber case.
    pub fn emit_route(&self, event: RouteEvent) {
        let _ = self.sender.send(CoreEvent::Route(event));
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let bus = EventBus::default();
/// // Only events about one message
/// let stream = EventStream::new(bus.subscribe())
///     .filter(|event| event.item_id() == Some("msg-42"));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter; only matching events are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching events are currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
