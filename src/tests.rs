//! End-to-end tests for the cart core against the in-memory backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::backend::{BackendOp, BackendStats, CartBackend, FailureLog, MemoryBackend};
use crate::config::CartConfig;
use crate::errors::CartError;
use crate::models::{CartAction, CartItem, CartOwner, SavedCartRecord};
use crate::store::CartStore;
use crate::sync::{SyncEngine, SyncHandle, SyncProgress};
use crate::view::{CartContext, CartDisplay, DisplayState};
use crate::CartSession;

const A: &str = "/experiment/ENCSR000AAA/";
const B: &str = "/experiment/ENCSR001AAA/";
const C: &str = "/experiment/ENCSR002AAA/";
const D: &str = "/experiment/ENCSR003AAA/";

/// Failure log that remembers what it was told.
#[derive(Default)]
struct RecordingLog {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingLog {
    fn tags(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}

impl FailureLog for RecordingLog {
    fn log_failure(&self, tag: &str, error: &CartError) {
        self.entries
            .lock()
            .unwrap()
            .push((tag.to_string(), error.to_string()));
    }
}

/// Test fixture for sync tests.
struct TestFixture {
    backend: Arc<MemoryBackend>,
    log: Arc<RecordingLog>,
    store: CartStore,
    sync: SyncHandle,
}

impl TestFixture {
    fn new(owner: Option<CartOwner>) -> Self {
        Self::with_backend(MemoryBackend::new(), owner)
    }

    fn with_backend(backend: MemoryBackend, owner: Option<CartOwner>) -> Self {
        let backend = Arc::new(backend);
        let log = Arc::new(RecordingLog::default());
        let store = CartStore::default();
        let sync = SyncEngine::new(backend.clone(), log.clone(), owner).spawn(store.clone());

        TestFixture {
            backend,
            log,
            store,
            sync,
        }
    }

    async fn settle(&mut self, cycles: u64) -> SyncProgress {
        tokio::time::timeout(Duration::from_secs(5), self.sync.wait_for_cycles(cycles))
            .await
            .expect("sync did not settle")
    }

    fn saved(&self) -> SavedCartRecord {
        self.store
            .state()
            .saved_cart
            .clone()
            .expect("no saved cart cached")
    }
}

fn owner() -> CartOwner {
    CartOwner::new("/users/jdoe/", "J. Doe")
}

fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_first_sync_creates_cart() {
    let mut fixture = TestFixture::new(Some(owner()));

    fixture.store.add(A);
    let progress = fixture.settle(1).await;

    assert_eq!(progress.completed, 1);
    assert!(progress.last_synced_at.is_some());
    let stats = fixture.backend.stats();
    assert_eq!((stats.creates, stats.fetches, stats.writes), (1, 0, 0));

    let saved = fixture.saved();
    assert_eq!(saved.items, vec![A]);
    assert_eq!(fixture.backend.record(&saved.id).await, Some(saved.clone()));
    // Server-assigned fields come back with the cached copy
    assert_eq!(saved.schema_version, "1");
    assert!(saved.extra.contains_key("date_created"));
}

#[tokio::test]
async fn test_later_syncs_update_created_cart() {
    let mut fixture = TestFixture::new(Some(owner()));

    fixture.store.add(A);
    fixture.settle(1).await;
    let created = fixture.saved();

    fixture.store.dispatch(CartAction::add_many([B, C]));
    fixture.settle(2).await;

    let stats = fixture.backend.stats();
    assert_eq!((stats.creates, stats.fetches, stats.writes), (1, 1, 1));
    let saved = fixture.saved();
    assert_eq!(saved.id, created.id);
    assert_eq!(saved.items, vec![A, B, C]);
    assert!(saved.extra.contains_key("last_modified"));
}

#[tokio::test]
async fn test_sync_writes_existing_user_cart() {
    let backend = MemoryBackend::new();
    let mut existing = SavedCartRecord::new("/carts/one/", ids(&[D]));
    existing.name = "J. Doe cart".into();
    existing.submitted_by = "/users/jdoe/".into();
    existing.status = "current".into();
    existing.extra.insert("description".into(), json!("kept"));
    backend.insert_record(existing.clone()).await;

    let mut user = owner();
    user.carts = vec![existing];
    let mut fixture = TestFixture::with_backend(backend, Some(user));

    fixture.store.add(A);
    fixture.settle(1).await;

    let saved = fixture.saved();
    assert_eq!(saved.id, "/carts/one/");
    // The active cart replaces the server list wholesale
    assert_eq!(saved.items, vec![A]);
    assert_eq!(saved.submitted_by, "/users/jdoe/");
    assert_eq!(saved.extra.get("description"), Some(&json!("kept")));
    assert_eq!(fixture.backend.stats().creates, 0);
}

#[tokio::test]
async fn test_changes_during_sync_are_coalesced() {
    let backend = MemoryBackend::new().with_latency(Duration::from_millis(50));
    let mut fixture = TestFixture::with_backend(backend, Some(owner()));
    let mut progress = fixture.sync.subscribe();

    fixture.store.add(A);
    tokio::time::timeout(Duration::from_secs(5), progress.wait_for(|p| p.in_flight))
        .await
        .expect("sync never started")
        .unwrap();

    fixture.store.add(B);
    fixture.store.add(C);
    fixture.store.add(D);
    let settled = fixture.settle(2).await;

    assert_eq!(settled.completed, 2);
    assert!(!settled.in_flight);
    let stats = fixture.backend.stats();
    assert_eq!(stats.max_concurrent_writes, 1);
    assert_eq!((stats.creates, stats.writes), (1, 1));

    let saved = fixture.saved();
    assert_eq!(saved.items, vec![A, B, C, D]);
    assert_eq!(fixture.backend.record(&saved.id).await.unwrap().items, vec![A, B, C, D]);
}

#[tokio::test]
async fn test_failed_sync_keeps_active_cart_and_retries_on_change() {
    let backend = MemoryBackend::new();
    backend.fail_next(BackendOp::Create, 500);
    let mut fixture = TestFixture::with_backend(backend, Some(owner()));

    fixture.store.add(A);
    let progress = fixture.settle(1).await;

    assert_eq!(progress.failed, 1);
    assert_eq!(fixture.log.tags(), vec!["create cart"]);
    assert_eq!(fixture.store.state().items, vec![A]);
    assert!(fixture.store.state().saved_cart.is_none());
    assert_eq!(fixture.backend.record_count().await, 0);

    fixture.store.add(B);
    let progress = fixture.settle(2).await;

    assert_eq!(progress.completed, 1);
    assert_eq!(fixture.saved().items, vec![A, B]);
}

#[tokio::test]
async fn test_failed_write_is_tagged() {
    let mut fixture = TestFixture::new(Some(owner()));
    fixture.store.add(A);
    fixture.settle(1).await;

    fixture.backend.fail_next(BackendOp::Fetch, 503);
    fixture.store.add(B);
    fixture.settle(2).await;

    fixture.backend.fail_next(BackendOp::Write, 409);
    fixture.store.add(C);
    fixture.settle(3).await;

    assert_eq!(fixture.log.tags(), vec!["get writable cart", "update cart"]);
    assert_eq!(fixture.store.state().items, vec![A, B, C]);
    // Cache still holds the last confirmed copy
    assert_eq!(fixture.saved().items, vec![A]);

    fixture.store.remove(B);
    fixture.settle(4).await;
    assert_eq!(fixture.saved().items, vec![A, C]);
}

#[tokio::test]
async fn test_deleted_cart_is_recreated() {
    let mut fixture = TestFixture::new(Some(owner()));
    fixture.store.add(A);
    fixture.settle(1).await;
    let first = fixture.saved();

    fixture.backend.remove_record(&first.id).await.unwrap();

    fixture.store.add(B);
    let progress = fixture.settle(2).await;
    assert_eq!(progress.completed, 2);

    let replacement = fixture.saved();
    assert_ne!(replacement.id, first.id);
    assert_eq!(replacement.items, vec![A, B]);
    assert_eq!(fixture.backend.record_count().await, 1);

    // Later changes go to the replacement
    fixture.store.add(C);
    fixture.store.add(D);
    fixture.settle(3).await;
    assert_eq!(fixture.saved().id, replacement.id);
    assert_eq!(
        fixture.backend.record(&replacement.id).await.unwrap().items,
        vec![A, B, C, D]
    );

    let stats = fixture.backend.stats();
    assert_eq!((stats.creates, stats.fetches, stats.writes), (2, 2, 1));
    assert!(fixture.log.tags().is_empty());
}

#[tokio::test]
async fn test_unchanged_cart_makes_no_requests() {
    let mut fixture = TestFixture::new(Some(owner()));
    fixture.store.add(A);
    fixture.settle(1).await;

    // Re-caching the saved copy and no-op actions leave the items alone
    let saved = fixture.saved();
    fixture.store.dispatch(CartAction::set_saved(saved));
    fixture.store.add(A);
    fixture.store.remove(D);
    fixture.store.dispatch(CartAction::Unknown);

    fixture.store.add(B);
    let progress = fixture.settle(2).await;

    assert_eq!(progress.cycles(), 2);
    let stats = fixture.backend.stats();
    assert_eq!((stats.creates, stats.fetches, stats.writes), (1, 1, 1));
}

#[tokio::test]
async fn test_anonymous_cart_never_syncs() {
    let fixture = TestFixture::new(None);

    fixture.store.add(A);
    fixture.store.add(B);
    fixture.store.remove(A);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(fixture.store.state().items, vec![B]);
    assert_eq!(fixture.sync.progress(), SyncProgress::default());
    assert_eq!(fixture.backend.stats(), BackendStats::default());
}

#[tokio::test]
async fn test_merge_shared_cart_into_own() {
    let backend = MemoryBackend::new();
    for id in [A, B, C, D] {
        backend.add_object(id, &["Experiment", "Dataset"]).await;
    }
    let theirs = backend
        .create_record(&crate::models::NewCart {
            name: "R. Roe cart".into(),
            items: ids(&[B, C]),
            submitted_by: "/users/rroe/".into(),
            status: "current".into(),
        })
        .await
        .unwrap();
    let mut fixture = TestFixture::with_backend(backend, Some(owner()));

    fixture.store.add(A);
    fixture.settle(1).await;

    // Viewing their cart shows only their items
    let mut display = CartDisplay::new(fixture.log.clone());
    let shared = CartContext::Shared(theirs.clone());
    display
        .refresh_from(&shared, &fixture.store.state(), &*fixture.backend)
        .await;
    match display.state() {
        DisplayState::ContentsReady { results, missing } => {
            assert_eq!(results.ids(), vec![B, C]);
            assert!(missing.is_empty());
        }
        other => panic!("unexpected state {:?}", other),
    }

    fixture.store.merge_shared(&theirs.items);
    fixture.settle(2).await;
    assert_eq!(fixture.saved().items, vec![A, B, C]);
    assert_eq!(
        fixture.backend.record(&theirs.id).await.unwrap().items,
        vec![B, C]
    );

    // Own cart page shows active and saved together
    let mut working = CartDisplay::new(fixture.log.clone());
    working
        .refresh_from(
            &CartContext::Working,
            &fixture.store.state(),
            &*fixture.backend,
        )
        .await;
    assert_eq!(working.resolved(), Some(&ids(&[A, B, C])[..]));
}

#[tokio::test]
async fn test_session_add_all_filters_types() {
    let config = CartConfig {
        allowed_types: vec!["Experiment".to_string()],
        ..CartConfig::default()
    };
    let backend = Arc::new(MemoryBackend::new());
    let log = Arc::new(RecordingLog::default());
    let mut session = CartSession::start(&config, backend.clone(), log.clone(), Some(owner()));

    let candidates = vec![
        CartItem::new(A, ["Experiment", "Dataset"]),
        CartItem::new("/annotations/ENCSR999AAA/", ["Annotation", "Dataset"]),
        CartItem::new(B, ["Experiment", "Dataset"]),
    ];
    assert!(session.add_all(&candidates));
    assert!(!session.add_all(&candidates));
    assert_eq!(session.store().state().items, vec![A, B]);
    assert_eq!(session.store().state().name, "Untitled");

    tokio::time::timeout(Duration::from_secs(5), session.sync().wait_for_cycles(1))
        .await
        .unwrap();
    let status = session.status();
    assert_eq!(status.count, 2);
    assert_eq!(status.unsaved, 0);
    assert!(status.can_share);

    assert!(session.remove_all(&candidates[..1]));
    assert_eq!(session.store().state().items, vec![B]);
    assert_eq!(session.status().unsaved, 0);
    assert!(log.tags().is_empty());
}

#[tokio::test]
async fn test_session_starts_with_owner_saved_cart() {
    let backend = Arc::new(MemoryBackend::new());
    for id in [A, D] {
        backend.add_object(id, &["Experiment", "Dataset"]).await;
    }
    let mut existing = SavedCartRecord::new("/carts/one/", ids(&[D]));
    existing.submitted_by = "/users/jdoe/".into();
    backend.insert_record(existing.clone()).await;

    let mut user = owner();
    user.carts = vec![existing];
    let log = Arc::new(RecordingLog::default());
    let mut session = CartSession::start(
        &CartConfig::default(),
        backend.clone(),
        log.clone(),
        Some(user),
    );

    let status = session.status();
    assert_eq!(status.count, 0);
    assert!(status.visible);
    assert!(status.can_share);
    assert_eq!(
        session.store().state().saved_cart.as_ref().map(|r| r.id.as_str()),
        Some("/carts/one/")
    );

    let mut working = CartDisplay::new(log.clone());
    working
        .refresh_from(&CartContext::Working, &session.store().state(), &*backend)
        .await;
    assert_eq!(working.resolved(), Some(&ids(&[D])[..]));
    assert!(matches!(working.state(), DisplayState::ContentsReady { .. }));

    // Caching the saved cart is not a change to sync
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.sync().progress(), SyncProgress::default());

    session.store().add(A);
    tokio::time::timeout(Duration::from_secs(5), session.sync().wait_for_cycles(1))
        .await
        .unwrap();
    let stats = backend.stats();
    assert_eq!((stats.creates, stats.fetches, stats.writes), (0, 1, 1));
    assert_eq!(backend.record("/carts/one/").await.unwrap().items, vec![A]);
    assert!(log.tags().is_empty());
}
