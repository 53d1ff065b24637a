//! Collaborators the cart core talks to.
//!
//! The transport is not part of this crate. Callers supply implementations of these traits;
//! `MemoryBackend` serves tests and local development.

mod memory;

pub use memory::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CartError;
use crate::models::{EditableCart, NewCart, SavedCartRecord};

/// Storage operations on cart records.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Read a record in its writable form, without identity or read-only fields.
    async fn fetch_editable_record(&self, id: &str) -> Result<EditableCart, CartError>;

    /// Overwrite a record. Returns the record as the server stored it.
    async fn write_record(
        &self,
        id: &str,
        record: &EditableCart,
    ) -> Result<SavedCartRecord, CartError>;

    /// Create a new cart record.
    async fn create_record(&self, payload: &NewCart) -> Result<SavedCartRecord, CartError>;
}

/// Query resolving cart identifiers into full objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub ids: Vec<String>,
}

impl SearchQuery {
    pub fn for_ids(ids: &[String]) -> Self {
        Self { ids: ids.to_vec() }
    }

    /// Portal search query string, one form-encoded `@id` term per item.
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for id in &self.ids {
            query.append_pair("@id", id);
        }
        query.finish()
    }
}

/// Objects returned by a search, as raw JSON with at least an `@id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "@graph", default)]
    pub graph: Vec<serde_json::Value>,
}

impl SearchResults {
    /// `@id`s of the returned objects.
    pub fn ids(&self) -> Vec<String> {
        self.graph
            .iter()
            .filter_map(|obj| obj.get("@id").and_then(|id| id.as_str()))
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

/// Search lookups for the cart display.
#[async_trait]
pub trait CartSearch: Send + Sync {
    /// Resolve the query. Nothing matching is an empty result, not an error.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, CartError>;
}

/// Sink for failures the core swallows.
pub trait FailureLog: Send + Sync {
    /// Record a failed operation. Must not panic or block.
    fn log_failure(&self, tag: &str, error: &CartError);
}

/// Failure log writing to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureLog;

impl FailureLog for TracingFailureLog {
    fn log_failure(&self, tag: &str, error: &CartError) {
        match error.response_body() {
            Some(body) => tracing::warn!(
                tag,
                code = error.error_code(),
                response = %body,
                "Cart operation failed: {}",
                error
            ),
            None => tracing::warn!(
                tag,
                code = error.error_code(),
                "Cart operation failed: {}",
                error
            ),
        }
    }
}
