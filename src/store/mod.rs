//! Cart state container.
//!
//! One owned cell holds the current `CartState`. Every change goes through the pure reducer,
//! and observers are notified through a watch channel only when the state actually changed.

mod reducer;

pub use reducer::*;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::config::CartConfig;
use crate::models::{CartAction, CartState};

/// Single writer, many readers state cell for the active cart.
#[derive(Clone)]
pub struct CartStore {
    state: Arc<Mutex<Arc<CartState>>>,
    notify: Arc<watch::Sender<Arc<CartState>>>,
}

impl CartStore {
    /// Create a store holding `initial`.
    pub fn new(initial: CartState) -> Self {
        let initial = Arc::new(initial);
        let (notify, _) = watch::channel(Arc::clone(&initial));
        Self {
            state: Arc::new(Mutex::new(initial)),
            notify: Arc::new(notify),
        }
    }

    /// Create an empty store named per configuration.
    pub fn from_config(config: &CartConfig) -> Self {
        Self::new(CartState::new(config.default_name.clone()))
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<CartState> {
        Arc::clone(&self.lock())
    }

    /// Receiver that sees every state the store publishes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartState>> {
        self.notify.subscribe()
    }

    /// Apply an action. Returns true if the state changed.
    pub fn dispatch(&self, action: CartAction) -> bool {
        let mut current = self.lock();
        let next = reduce(&current, &action);
        if Arc::ptr_eq(&current, &next) {
            return false;
        }
        *current = Arc::clone(&next);
        // Published while the lock is held so observers see transitions in dispatch order
        self.notify.send_replace(next);
        true
    }

    pub fn add(&self, id: impl Into<String>) -> bool {
        self.dispatch(CartAction::add(id))
    }

    pub fn remove(&self, id: impl Into<String>) -> bool {
        self.dispatch(CartAction::remove(id))
    }

    /// Add the item if absent, remove it if present.
    pub fn toggle(&self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.state().contains(&id) {
            self.remove(id)
        } else {
            self.add(id)
        }
    }

    /// Empty the active cart.
    pub fn clear(&self) -> bool {
        let items = self.state().items.clone();
        self.dispatch(CartAction::RemoveMany { ids: items })
    }

    /// Copy a shared cart's items into the active cart.
    pub fn merge_shared(&self, shared_items: &[String]) -> bool {
        self.dispatch(CartAction::AddMany {
            ids: shared_items.to_vec(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Arc<CartState>> {
        // The reducer cannot panic halfway through a write, so a poisoned cell is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(CartState::default())
    }
}
