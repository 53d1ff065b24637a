//! In-memory cart backend for testing and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{CartBackend, CartSearch, SearchQuery, SearchResults};
use crate::errors::CartError;
use crate::models::{EditableCart, NewCart, SavedCartRecord};

/// Schema version stamped on records this backend creates.
pub const SCHEMA_VERSION: &str = "1";

/// Fields the server assigns; never part of the writable representation.
const SERVER_FIELDS: [&str; 2] = ["date_created", "last_modified"];

/// Backend operation, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Fetch,
    Write,
    Create,
    Search,
}

struct CatalogueEntry {
    object: Value,
    visible: bool,
}

/// Request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub fetches: usize,
    pub writes: usize,
    pub creates: usize,
    pub searches: usize,
    /// Highest number of writes and creates that were in flight at once
    pub max_concurrent_writes: usize,
}

/// Cart records and searchable objects held in memory.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, SavedCartRecord>>,
    catalogue: RwLock<HashMap<String, CatalogueEntry>>,
    failures: Mutex<HashMap<BackendOp, u16>>,
    latency: Option<Duration>,
    search_latency: Option<Duration>,
    fetches: AtomicUsize,
    writes: AtomicUsize,
    creates: AtomicUsize,
    searches: AtomicUsize,
    in_flight_writes: AtomicUsize,
    max_concurrent_writes: AtomicUsize,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write and create by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay every search by `latency`.
    pub fn with_search_latency(mut self, latency: Duration) -> Self {
        self.search_latency = Some(latency);
        self
    }

    /// Store a record as-is, replacing any record with the same id.
    pub async fn insert_record(&self, record: SavedCartRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    /// Server copy of a record.
    pub async fn record(&self, id: &str) -> Option<SavedCartRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Delete a record, as another session or an admin would.
    pub async fn remove_record(&self, id: &str) -> Option<SavedCartRecord> {
        self.records.write().await.remove(id)
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Make an object findable by search.
    pub async fn add_object(&self, id: &str, types: &[&str]) {
        self.catalogue.write().await.insert(
            id.to_string(),
            CatalogueEntry {
                object: json!({ "@id": id, "@type": types }),
                visible: true,
            },
        );
    }

    /// Hide an object from search results, as if the viewer lacked permission.
    pub async fn restrict_object(&self, id: &str) {
        if let Some(entry) = self.catalogue.write().await.get_mut(id) {
            entry.visible = false;
        }
    }

    /// Make the next call of `op` fail with `status`.
    pub fn fail_next(&self, op: BackendOp, status: u16) {
        self.lock_failures().insert(op, status);
    }

    pub fn stats(&self) -> BackendStats {
        BackendStats {
            fetches: self.fetches.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
            creates: self.creates.load(Ordering::SeqCst),
            searches: self.searches.load(Ordering::SeqCst),
            max_concurrent_writes: self.max_concurrent_writes.load(Ordering::SeqCst),
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<BackendOp, u16>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn injected_failure(&self, op: BackendOp) -> Result<(), CartError> {
        match self.lock_failures().remove(&op) {
            Some(status) => Err(CartError::Write {
                status,
                body: json!({ "status": "error", "code": status }),
            }),
            None => Ok(()),
        }
    }

    async fn begin_write(&self) -> WriteGuard<'_> {
        let now = self.in_flight_writes.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_writes.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        WriteGuard {
            in_flight: &self.in_flight_writes,
        }
    }
}

struct WriteGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartBackend for MemoryBackend {
    async fn fetch_editable_record(&self, id: &str) -> Result<EditableCart, CartError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.injected_failure(BackendOp::Fetch)?;

        let records = self.records.read().await;
        let record = records
            .get(id)
            .ok_or_else(|| CartError::NotFound(id.to_string()))?;

        let mut editable = record.to_editable();
        for field in SERVER_FIELDS {
            editable.extra.remove(field);
        }
        Ok(editable)
    }

    async fn write_record(
        &self,
        id: &str,
        record: &EditableCart,
    ) -> Result<SavedCartRecord, CartError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let _guard = self.begin_write().await;
        self.injected_failure(BackendOp::Write)?;

        let mut records = self.records.write().await;
        let existing = records
            .get_mut(id)
            .ok_or_else(|| CartError::NotFound(id.to_string()))?;

        let date_created = existing.extra.get("date_created").cloned();
        existing.items = record.items.clone();
        existing.name = record.name.clone();
        if !record.status.is_empty() {
            existing.status = record.status.clone();
        }
        if !record.schema_version.is_empty() {
            existing.schema_version = record.schema_version.clone();
        }
        existing.extra = record.extra.clone();
        if let Some(date_created) = date_created {
            existing.extra.insert("date_created".into(), date_created);
        }
        existing
            .extra
            .insert("last_modified".into(), json!(Utc::now().to_rfc3339()));

        Ok(existing.clone())
    }

    async fn create_record(&self, payload: &NewCart) -> Result<SavedCartRecord, CartError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let _guard = self.begin_write().await;
        self.injected_failure(BackendOp::Create)?;

        let id = format!("/carts/{}/", uuid::Uuid::new_v4());
        let mut record = SavedCartRecord::new(id.clone(), payload.items.clone());
        record.name = payload.name.clone();
        record.submitted_by = payload.submitted_by.clone();
        record.status = payload.status.clone();
        record.schema_version = SCHEMA_VERSION.to_string();
        record
            .extra
            .insert("date_created".into(), json!(Utc::now().to_rfc3339()));

        self.records.write().await.insert(id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CartSearch for MemoryBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, CartError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.injected_failure(BackendOp::Search)?;
        if let Some(latency) = self.search_latency {
            tokio::time::sleep(latency).await;
        }

        let catalogue = self.catalogue.read().await;
        let graph = query
            .ids
            .iter()
            .filter_map(|id| catalogue.get(id))
            .filter(|entry| entry.visible)
            .map(|entry| entry.object.clone())
            .collect();
        Ok(SearchResults { graph })
    }
}
