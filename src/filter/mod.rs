//! Allow-list of object types that may enter the cart.
//!
//! The store accepts any identifier; controls that add or remove several objects at once run
//! their candidates through this filter first.

use std::collections::HashSet;

use crate::config::CartConfig;
use crate::models::CartItem;

/// Object `@type`s permitted in the cart.
#[derive(Debug, Clone)]
pub struct AllowedTypes {
    types: HashSet<String>,
}

impl AllowedTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &CartConfig) -> Self {
        Self::new(config.allowed_types.iter().cloned())
    }

    /// True if any of the item's types is allowed.
    pub fn is_allowed(&self, item: &CartItem) -> bool {
        item.types.iter().any(|t| self.types.contains(t))
    }

    /// Allowed items in their original order.
    pub fn filter_allowed(&self, items: &[CartItem]) -> Vec<CartItem> {
        items
            .iter()
            .filter(|item| self.is_allowed(item))
            .cloned()
            .collect()
    }

    /// `@id`s of the allowed items, ready for `AddMany`/`RemoveMany`.
    pub fn allowed_ids(&self, items: &[CartItem]) -> Vec<String> {
        items
            .iter()
            .filter(|item| self.is_allowed(item))
            .map(|item| item.id.clone())
            .collect()
    }
}

impl Default for AllowedTypes {
    fn default() -> Self {
        Self::from_config(&CartConfig::default())
    }
}
