//! Synchronization of the active cart with the user's server-side cart record.
//!
//! A single task watches the store. When the active items change it writes them to the
//! server, then caches the record the server confirmed with `SetSavedCart`. Cycles never
//! overlap: changes made while a cycle is in flight are coalesced by the watch channel and
//! picked up, as the latest state, once the cycle settles. Failures are logged and leave the
//! active cart alone; the next change retries from whatever the active cart holds then.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::{CartBackend, FailureLog};
use crate::config::CartConfig;
use crate::errors::{tags, CartError};
use crate::models::{CartAction, CartOwner, CartState, NewCart, SavedCartRecord};
use crate::store::CartStore;

/// Counters published by a running sync task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncProgress {
    /// Cycles that ended with a server-confirmed record
    pub completed: u64,
    /// Cycles that ended in a logged failure
    pub failed: u64,
    pub in_flight: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncProgress {
    pub fn cycles(&self) -> u64 {
        self.completed + self.failed
    }
}

/// Writes the active cart to the backend for a logged-in owner.
#[derive(Clone)]
pub struct SyncEngine {
    backend: Arc<dyn CartBackend>,
    failures: Arc<dyn FailureLog>,
    owner: Option<CartOwner>,
    record_status: String,
}

impl SyncEngine {
    /// Create an engine. `owner` is `None` for anonymous sessions, which never sync.
    pub fn new(
        backend: Arc<dyn CartBackend>,
        failures: Arc<dyn FailureLog>,
        owner: Option<CartOwner>,
    ) -> Self {
        Self {
            backend,
            failures,
            owner,
            record_status: CartConfig::default().record_status,
        }
    }

    pub fn with_config(mut self, config: &CartConfig) -> Self {
        self.record_status = config.record_status.clone();
        self
    }

    pub fn owner(&self) -> Option<&CartOwner> {
        self.owner.as_ref()
    }

    /// Run one synchronization cycle for `items`.
    ///
    /// Writes to the cached record if there is one, else to the owner's first cart, else
    /// creates a cart. A target the server no longer has is replaced by a new cart.
    /// Failures are logged before being returned.
    pub async fn save(
        &self,
        items: &[String],
        saved: Option<&SavedCartRecord>,
    ) -> Result<SavedCartRecord, CartError> {
        let owner = self.owner.as_ref().ok_or(CartError::NotLoggedIn)?;

        let target = saved
            .map(|record| record.id.as_str())
            .or_else(|| owner.primary_cart());

        let result = match target {
            Some(id) => match self.update(id, items).await {
                Err((_, CartError::NotFound(_))) => {
                    tracing::info!(cart = id, "Cart record no longer exists, creating a new one");
                    self.create(owner, items).await
                }
                other => other,
            },
            None => self.create(owner, items).await,
        };

        result.map_err(|(tag, error)| {
            self.failures.log_failure(tag, &error);
            error
        })
    }

    /// Fetch the writable record, overlay the items and write it back.
    async fn update(
        &self,
        id: &str,
        items: &[String],
    ) -> Result<SavedCartRecord, (&'static str, CartError)> {
        tracing::debug!(cart = id, items = items.len(), "Updating cart record");

        let mut writable = self
            .backend
            .fetch_editable_record(id)
            .await
            .map_err(|e| (tags::GET_WRITABLE_CART, e))?;

        writable.items = items.to_vec();

        let record = self
            .backend
            .write_record(id, &writable)
            .await
            .map_err(|e| (tags::UPDATE_CART, e))?;

        tracing::info!(cart = %record.id, items = record.items.len(), "Cart saved");
        Ok(record)
    }

    async fn create(
        &self,
        owner: &CartOwner,
        items: &[String],
    ) -> Result<SavedCartRecord, (&'static str, CartError)> {
        tracing::debug!(owner = %owner.id, items = items.len(), "Creating cart record");

        let payload = NewCart {
            name: format!("{} cart", owner.title),
            items: items.to_vec(),
            submitted_by: owner.id.clone(),
            status: self.record_status.clone(),
        };

        let record = self
            .backend
            .create_record(&payload)
            .await
            .map_err(|e| (tags::CREATE_CART, e))?;

        tracing::info!(cart = %record.id, items = record.items.len(), "Cart created");
        Ok(record)
    }

    /// Start watching `store`. The task runs until the handle is aborted or dropped.
    pub fn spawn(self, store: CartStore) -> SyncHandle {
        let (progress_tx, progress_rx) = watch::channel(SyncProgress::default());
        let changes = store.subscribe();
        let task = tokio::spawn(self.run(store, changes, progress_tx));
        SyncHandle {
            task,
            progress: progress_rx,
        }
    }

    async fn run(
        self,
        store: CartStore,
        mut changes: watch::Receiver<Arc<CartState>>,
        progress: watch::Sender<SyncProgress>,
    ) {
        if self.owner.is_none() {
            tracing::debug!("No logged-in user; cart stays in memory only");
        }

        let mut observed: Vec<String> = Vec::new();

        loop {
            let state = Arc::clone(&changes.borrow_and_update());

            if self.owner.is_some() && cart_changed(&observed, &state.items) {
                observed = state.items.clone();
                progress.send_modify(|p| p.in_flight = true);

                match self.save(&state.items, state.saved_cart.as_ref()).await {
                    Ok(record) => {
                        store.dispatch(CartAction::set_saved(record));
                        progress.send_modify(|p| {
                            p.in_flight = false;
                            p.completed += 1;
                            p.last_synced_at = Some(Utc::now());
                        });
                    }
                    Err(_) => progress.send_modify(|p| {
                        p.in_flight = false;
                        p.failed += 1;
                    }),
                }

                // Whatever changed during the cycle is already waiting in `changes`
                continue;
            }

            if changes.changed().await.is_err() {
                break;
            }
        }
    }
}

/// True if the active items differ in length or content.
pub fn cart_changed(previous: &[String], next: &[String]) -> bool {
    previous.len() != next.len() || previous != next
}

/// Handle to a running sync task.
pub struct SyncHandle {
    task: JoinHandle<()>,
    progress: watch::Receiver<SyncProgress>,
}

impl SyncHandle {
    pub fn progress(&self) -> SyncProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.clone()
    }

    /// Wait until at least `cycles` cycles have settled.
    pub async fn wait_for_cycles(&mut self, cycles: u64) -> SyncProgress {
        let settled = self
            .progress
            .wait_for(|p| p.cycles() >= cycles)
            .await
            .map(|p| p.clone());
        settled.unwrap_or_else(|_| self.progress.borrow().clone())
    }

    /// Stop the task. An in-flight request is dropped at its next suspension point.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
