//! Display session for a cart page.
//!
//! `Idle → FetchingContents → (ContentsReady | ContentsEmpty)`, re-entering `FetchingContents`
//! whenever the resolved identifiers change. No state is terminal. Every transition is
//! published on a watch channel, so a page can render `FetchingContents` while a search runs.

use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::{CartSearch, FailureLog, SearchQuery, SearchResults};
use crate::errors::tags;
use crate::models::CartState;
use crate::sync::cart_changed;

use super::{find_missing, resolve_items, CartContext};

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Idle,
    FetchingContents,
    /// Search returned objects; `missing` lists requested ids it did not return
    ContentsReady {
        results: SearchResults,
        missing: Vec<String>,
    },
    /// Nothing to show
    ContentsEmpty { missing: Vec<String> },
}

/// Keeps a cart page's contents in step with its inputs.
pub struct CartDisplay {
    state: DisplayState,
    published: watch::Sender<DisplayState>,
    resolved: Option<Vec<String>>,
    failures: Arc<dyn FailureLog>,
}

impl CartDisplay {
    pub fn new(failures: Arc<dyn FailureLog>) -> Self {
        let (published, _) = watch::channel(DisplayState::Idle);
        Self {
            state: DisplayState::Idle,
            published,
            resolved: None,
            failures,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Follow state transitions, including `FetchingContents` while a search is pending.
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.published.subscribe()
    }

    fn set_state(&mut self, state: DisplayState) {
        self.published.send_replace(state.clone());
        self.state = state;
    }

    /// Identifiers the current contents were fetched for.
    pub fn resolved(&self) -> Option<&[String]> {
        self.resolved.as_deref()
    }

    /// Recompute the contents for `context`. Returns true if a search was issued.
    pub async fn refresh(
        &mut self,
        context: &CartContext,
        active: &[String],
        saved: &[String],
        search: &dyn CartSearch,
    ) -> bool {
        let items = resolve_items(context, active, saved);
        if let Some(previous) = &self.resolved {
            if !cart_changed(previous, &items) {
                return false;
            }
        }
        self.resolved = Some(items.clone());

        if items.is_empty() {
            self.set_state(DisplayState::ContentsEmpty {
                missing: Vec::new(),
            });
            return false;
        }

        self.set_state(DisplayState::FetchingContents);
        tracing::debug!(items = items.len(), "Fetching cart contents");

        match search.search(&SearchQuery::for_ids(&items)).await {
            Ok(results) => {
                let missing = find_missing(&items, &results);
                if !missing.is_empty() {
                    tracing::debug!(missing = missing.len(), "Cart items not visible to viewer");
                }
                self.set_state(if results.is_empty() {
                    DisplayState::ContentsEmpty { missing }
                } else {
                    DisplayState::ContentsReady { results, missing }
                });
            }
            Err(error) => {
                self.failures.log_failure(tags::SEARCH_CART, &error);
                self.set_state(DisplayState::Idle);
                self.resolved = None;
            }
        }
        true
    }

    /// `refresh` with the active and saved items taken from a store snapshot.
    pub async fn refresh_from(
        &mut self,
        context: &CartContext,
        state: &CartState,
        search: &dyn CartSearch,
    ) -> bool {
        self.refresh(context, &state.items, state.saved_items(), search)
            .await
    }
}
