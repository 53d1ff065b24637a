//! In-memory cart state held by the store.

use serde::{Deserialize, Serialize};

use super::SavedCartRecord;

/// Full client-side cart state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Active cart contents as `@id`s, in insertion order
    #[serde(rename = "activeItems")]
    pub items: Vec<String>,
    /// Display name of the cart
    #[serde(rename = "displayName")]
    pub name: String,
    /// Cache of the last server-confirmed cart record
    pub saved_cart: Option<SavedCartRecord>,
}

impl CartState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            name: name.into(),
            saved_cart: None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item == id)
    }

    /// Items of the cached server copy, empty when nothing is cached.
    pub fn saved_items(&self) -> &[String] {
        self.saved_cart
            .as_ref()
            .map(|record| record.items.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
