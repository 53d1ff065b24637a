//! Effective cart contents for display.
//!
//! A user's own cart page shows the active and saved carts together. A shared cart page shows
//! only what the shared record holds, whatever the viewer has in their own cart.

mod display;
mod status;

pub use display::*;
pub use status::*;

use std::collections::HashSet;

use crate::backend::SearchResults;
use crate::merge;
use crate::models::SavedCartRecord;

/// Where a cart is being displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum CartContext {
    /// The viewer's own working cart
    Working,
    /// Someone's cart reached through its `@id`
    Shared(SavedCartRecord),
}

/// Identifiers to display in `context`.
pub fn resolve_items(context: &CartContext, active: &[String], saved: &[String]) -> Vec<String> {
    match context {
        CartContext::Working => merge::union(active, saved),
        CartContext::Shared(record) => record.items.clone(),
    }
}

/// Requested identifiers the search did not return, usually hidden from this viewer.
pub fn find_missing(requested: &[String], results: &SearchResults) -> Vec<String> {
    let found: HashSet<String> = results.ids().into_iter().collect();
    requested
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .cloned()
        .collect()
}
