//! Status summaries for cart controls: counts, unsaved markers, share links.

use url::Url;

use crate::errors::CartError;
use crate::filter::AllowedTypes;
use crate::merge;
use crate::models::{CartItem, CartState};

/// What the cart menu should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartStatus {
    /// Number of items in the active cart
    pub count: usize,
    /// Active items not yet in the saved cart
    pub unsaved: usize,
    /// Menu shown at all
    pub visible: bool,
    /// Share entry offered
    pub can_share: bool,
}

impl CartStatus {
    pub fn from_state(state: &CartState, logged_in: bool) -> Self {
        let saved = state.saved_items();
        Self {
            count: state.items.len(),
            unsaved: unsaved_items(&state.items, saved).len(),
            visible: !state.items.is_empty() || !saved.is_empty(),
            can_share: logged_in && !saved.is_empty(),
        }
    }
}

/// True when an item's membership differs between the active and saved carts.
pub fn is_unsaved(id: &str, active: &[String], saved: &[String]) -> bool {
    let in_active = active.iter().any(|item| item == id);
    let in_saved = saved.iter().any(|item| item == id);
    in_active != in_saved
}

/// Active items the saved cart does not hold yet.
pub fn unsaved_items(active: &[String], saved: &[String]) -> Vec<String> {
    merge::difference(active, saved)
}

/// True when every allowed candidate is already in the cart, so "add all" has nothing to do.
pub fn all_in_cart(candidates: &[CartItem], active: &[String], filter: &AllowedTypes) -> bool {
    filter
        .allowed_ids(candidates)
        .iter()
        .all(|id| active.contains(id))
}

/// Link to a saved cart: the current page's origin with the cart's `@id` as path.
pub fn share_url(location: &str, cart_id: &str) -> Result<String, CartError> {
    let mut url = Url::parse(location)
        .map_err(|e| CartError::Validation(format!("invalid location {}: {}", location, e)))?;
    url.set_path(cart_id);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}
