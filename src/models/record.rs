//! Server-side cart record and the payloads used to create and rewrite it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A cart record as stored on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCartRecord {
    #[serde(rename = "@id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub submitted_by: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub schema_version: String,
    /// Fields the core does not interpret, kept for the round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SavedCartRecord {
    pub fn new(id: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            id: id.into(),
            items,
            name: String::new(),
            submitted_by: String::new(),
            status: String::new(),
            schema_version: String::new(),
            extra: Map::new(),
        }
    }

    /// Editable view of this record, without the `@id`.
    pub fn to_editable(&self) -> EditableCart {
        EditableCart {
            items: self.items.clone(),
            name: self.name.clone(),
            status: self.status.clone(),
            schema_version: self.schema_version.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Writable representation of a cart record.
///
/// Identity and server-assigned fields are absent, so the whole object can be submitted back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableCart {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema_version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for creating a cart record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCart {
    pub name: String,
    pub items: Vec<String>,
    pub submitted_by: String,
    pub status: String,
}

/// The logged-in user a cart belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartOwner {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: String,
    /// The user's cart records as the session reported them; the first one is the working cart
    #[serde(default)]
    pub carts: Vec<SavedCartRecord>,
}

impl CartOwner {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            carts: Vec::new(),
        }
    }

    /// The record synchronization writes to, if the user has one.
    pub fn primary_cart(&self) -> Option<&str> {
        self.saved_cart().map(|record| record.id.as_str())
    }

    /// Last saved copy of the working cart.
    pub fn saved_cart(&self) -> Option<&SavedCartRecord> {
        self.carts.first()
    }
}
