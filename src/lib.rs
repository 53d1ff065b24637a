//! ENCODE cart core
//!
//! In-memory cart of dataset and experiment identifiers, kept in step with the logged-in
//! user's cart record on the server.

pub mod backend;
pub mod config;
pub mod errors;
pub mod filter;
pub mod merge;
pub mod models;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod view;

use std::sync::Arc;

use backend::{CartBackend, FailureLog};
use config::CartConfig;
use filter::AllowedTypes;
use models::{CartAction, CartItem, CartOwner};
use store::CartStore;
use sync::{SyncEngine, SyncHandle};
use view::CartStatus;

/// Cart state and synchronization for one browser session.
pub struct CartSession {
    store: CartStore,
    filter: AllowedTypes,
    owner: Option<CartOwner>,
    sync: SyncHandle,
}

impl CartSession {
    /// Create an empty cart and start syncing it. Must be called inside a tokio runtime.
    ///
    /// The owner's saved cart, if any, is cached up front so the views and the menu see it
    /// before the first sync.
    pub fn start(
        config: &CartConfig,
        backend: Arc<dyn CartBackend>,
        failures: Arc<dyn FailureLog>,
        owner: Option<CartOwner>,
    ) -> Self {
        let store = CartStore::from_config(config);
        if let Some(saved) = owner.as_ref().and_then(CartOwner::saved_cart) {
            store.dispatch(CartAction::set_saved(saved.clone()));
        }
        let engine = SyncEngine::new(backend, failures, owner.clone()).with_config(config);
        let sync = engine.spawn(store.clone());

        tracing::info!(
            logged_in = owner.is_some(),
            allowed_types = ?config.allowed_types,
            "Cart session started"
        );

        Self {
            store,
            filter: AllowedTypes::from_config(config),
            owner,
            sync,
        }
    }

    pub fn store(&self) -> &CartStore {
        &self.store
    }

    pub fn filter(&self) -> &AllowedTypes {
        &self.filter
    }

    pub fn sync(&mut self) -> &mut SyncHandle {
        &mut self.sync
    }

    pub fn is_logged_in(&self) -> bool {
        self.owner.is_some()
    }

    /// Add every allowed candidate. Returns true if the cart changed.
    pub fn add_all(&self, candidates: &[CartItem]) -> bool {
        self.store.dispatch(CartAction::AddMany {
            ids: self.filter.allowed_ids(candidates),
        })
    }

    /// Remove every allowed candidate. Returns true if the cart changed.
    pub fn remove_all(&self, candidates: &[CartItem]) -> bool {
        self.store.dispatch(CartAction::RemoveMany {
            ids: self.filter.allowed_ids(candidates),
        })
    }

    pub fn status(&self) -> CartStatus {
        CartStatus::from_state(&self.store.state(), self.is_logged_in())
    }
}

#[cfg(test)]
mod tests;
