//! # Playback Registry
//!
//! Session-scoped coordinator guaranteeing that at most one message plays at
//! a time.
//!
//! Every mounted player registers a stop callback. Making a new item active
//! synchronously invokes the outgoing item's callback before the active id
//! changes, so the caller's subsequent `play()` can never overlap with the
//! previous sound.
//!
//! All operations take a re-entrant lock: they are atomic with respect to
//! other threads, while callbacks may still query the registry.

use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::item::ItemId;

/// Callback that stops a player. Must not block.
pub type StopCallback = Arc<dyn Fn() + Send + Sync>;

struct Entry {
    token: Uuid,
    callback: StopCallback,
}

#[derive(Default)]
struct RegistryState {
    active_id: Option<ItemId>,
    callbacks: HashMap<ItemId, Entry>,
}

/// Tracks the active item and the stop callbacks of every mounted player.
pub struct PlaybackRegistry {
    state: ReentrantMutex<RefCell<RegistryState>>,
}

impl Default for PlaybackRegistry {
    fn default() -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(RegistryState::default())),
        }
    }
}

impl PlaybackRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers (or replaces) the stop callback for `id`.
    ///
    /// The entry lives until the returned guard is dropped or the entry is
    /// replaced by a newer registration for the same id.
    pub fn register(self: &Arc<Self>, id: ItemId, callback: StopCallback) -> Registration {
        let token = Uuid::new_v4();
        {
            let guard = self.state.lock();
            let replaced = guard
                .borrow_mut()
                .callbacks
                .insert(id.clone(), Entry { token, callback })
                .is_some();
            debug!(item_id = %id, replaced, "Registered stop callback");
        }

        Registration {
            registry: Arc::downgrade(self),
            id,
            token,
        }
    }

    /// Removes the callback for `id`. Does not touch the active id.
    pub fn unregister(&self, id: &ItemId) {
        let guard = self.state.lock();
        if guard.borrow_mut().callbacks.remove(id).is_some() {
            debug!(item_id = %id, "Unregistered stop callback");
        }
    }

    fn unregister_token(&self, id: &ItemId, token: Uuid) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.callbacks.get(id).is_some_and(|entry| entry.token == token) {
            state.callbacks.remove(id);
            debug!(item_id = %id, "Registration released");
        }
    }

    /// Makes `id` the active item.
    ///
    /// When the active item changes, the outgoing item's stop callback runs
    /// to completion before the new id is stored. An outgoing id without a
    /// callback is skipped.
    pub fn set_active(&self, id: Option<ItemId>) {
        let guard = self.state.lock();

        let outgoing = {
            let state = guard.borrow();
            match &state.active_id {
                Some(previous) if Some(previous) != id.as_ref() => state
                    .callbacks
                    .get(previous)
                    .map(|entry| (previous.clone(), entry.callback.clone())),
                _ => None,
            }
        };

        if let Some((previous, callback)) = outgoing {
            debug!(item_id = %previous, "Stopping outgoing item");
            callback();
        }

        guard.borrow_mut().active_id = id;
    }

    /// Clears the active id only if `id` currently holds it.
    ///
    /// Returns whether the active id was cleared.
    pub fn clear_if_active(&self, id: &ItemId) -> bool {
        let _guard = self.state.lock();
        if self.is_active(id) {
            self.set_active(None);
            true
        } else {
            false
        }
    }

    /// Runs `f` while `id` is the active item, holding the registry lock so
    /// no other item can become active until `f` returns.
    ///
    /// Returns `None` without running `f` if `id` is not active.
    pub fn run_if_active<R>(&self, id: &ItemId, f: impl FnOnce() -> R) -> Option<R> {
        let _guard = self.state.lock();
        if self.is_active(id) {
            Some(f())
        } else {
            None
        }
    }

    /// Invokes every registered stop callback, then clears the active id.
    ///
    /// A panicking callback is logged and does not prevent the others from
    /// running.
    pub fn stop_all(&self) {
        let guard = self.state.lock();

        let callbacks: Vec<(ItemId, StopCallback)> = guard
            .borrow()
            .callbacks
            .iter()
            .map(|(id, entry)| (id.clone(), entry.callback.clone()))
            .collect();

        for (id, callback) in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                warn!(item_id = %id, "Stop callback panicked");
            }
        }

        guard.borrow_mut().active_id = None;
    }

    /// Stops everything and forgets all registrations.
    pub fn cleanup(&self) {
        let guard = self.state.lock();
        self.stop_all();
        let mut state = guard.borrow_mut();
        let released = state.callbacks.len();
        state.callbacks.clear();
        state.active_id = None;
        debug!(released, "Registry cleaned up");
    }

    pub fn active_id(&self) -> Option<ItemId> {
        self.state.lock().borrow().active_id.clone()
    }

    pub fn is_active(&self, id: &ItemId) -> bool {
        self.state.lock().borrow().active_id.as_ref() == Some(id)
    }

    pub fn is_registered(&self, id: &ItemId) -> bool {
        self.state.lock().borrow().callbacks.contains_key(id)
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.state.lock().borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PlaybackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let state = guard.borrow();
        f.debug_struct("PlaybackRegistry")
            .field("active_id", &state.active_id)
            .field("registered", &state.callbacks.len())
            .finish()
    }
}

/// Scoped registration. Dropping it removes the stop callback it installed.
#[must_use = "dropping a Registration unregisters the stop callback"]
pub struct Registration {
    registry: Weak<PlaybackRegistry>,
    id: ItemId,
    token: Uuid,
}

impl Registration {
    pub fn item_id(&self) -> &ItemId {
        &self.id
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister_token(&self.id, self.token);
        }
    }
}
