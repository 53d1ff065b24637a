//! Actions accepted by the cart reducer.

use serde::{Deserialize, Serialize};

use super::SavedCartRecord;

/// A discrete change requested of the cart store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CartAction {
    /// Add one identifier
    AddOne { id: String },
    /// Add several identifiers, keeping their order
    AddMany { ids: Vec<String> },
    /// Remove one identifier
    RemoveOne { id: String },
    /// Remove several identifiers
    RemoveMany { ids: Vec<String> },
    /// Replace the cached server copy
    SetSavedCart { record: Option<SavedCartRecord> },
    /// Anything else; leaves the state alone
    #[serde(other)]
    Unknown,
}

impl CartAction {
    pub fn add(id: impl Into<String>) -> Self {
        CartAction::AddOne { id: id.into() }
    }

    pub fn add_many<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CartAction::AddMany {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remove(id: impl Into<String>) -> Self {
        CartAction::RemoveOne { id: id.into() }
    }

    pub fn remove_many<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CartAction::RemoveMany {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn set_saved(record: SavedCartRecord) -> Self {
        CartAction::SetSavedCart {
            record: Some(record),
        }
    }
}
