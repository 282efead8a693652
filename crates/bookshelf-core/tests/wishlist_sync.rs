//! Sync engine against a mocked backend over real HTTP and an in-memory cache.

use std::sync::Arc;
use std::time::Duration;

use bookshelf_core::models::{BookDetails, WishlistEntry, WishlistItem};
use bookshelf_core::remote::HttpRemote;
use bookshelf_core::sync::PullOutcome;
use bookshelf_core::{DatabaseService, SyncEngine, SyncState};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DUNE_ISBN: &str = "9780441013593";

async fn engine(server: &MockServer) -> SyncEngine {
    let service = DatabaseService::open_in_memory().await.unwrap();
    let remote = HttpRemote::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    SyncEngine::new(
        service.wishlist_store(),
        service.catalog_store(),
        Arc::new(remote),
    )
}

fn dune() -> WishlistEntry {
    WishlistEntry::new(WishlistItem::from_book(BookDetails::new("Dune", DUNE_ISBN)))
}

fn dune_on_server() -> serde_json::Value {
    json!({"id": 42, "titol": "Dune", "isbn": DUNE_ISBN, "updatedAt": 1_700_000_000_000_i64})
}

async fn mount_offline_upsert(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/wishlist/upsert"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_add_reaches_server_on_next_sync() {
    let server = MockServer::start().await;
    mount_offline_upsert(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/upsertAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([dune_on_server()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wishlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([dune_on_server()])))
        .mount(&server)
        .await;

    let engine = engine(&server).await;
    let local_id = engine.add_or_update(dune()).await.unwrap();

    {
        let rows = engine.observe_all().borrow().clone();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].pending_sync);
        assert_eq!(rows[0].remote_id, None);
    }

    let report = engine.sync().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(report.pull, PullOutcome::Replaced { rows: 1 });
    assert_eq!(report.state, SyncState::Synced);
    assert_eq!(*engine.state().borrow(), SyncState::Synced);

    let rows = engine.observe_all().borrow().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].local_id, Some(local_id));
    assert_eq!(rows[0].remote_id, Some(42));
    assert!(!rows[0].pending_sync);
    assert!(engine.last_sync_at().await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_keeps_pending_rows() {
    let server = MockServer::start().await;
    mount_offline_upsert(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/upsertAll"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wishlist"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = engine(&server).await;
    engine.add_or_update(dune()).await.unwrap();

    let report = engine.sync().await.unwrap();
    assert_eq!(report.push_failures, 1);
    assert!(matches!(report.pull, PullOutcome::Failed { .. }));
    assert_eq!(report.state, SyncState::Offline);

    let rows = engine.observe_all().borrow().clone();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].pending_sync);
    assert_eq!(engine.last_sync_at().await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn confirmed_row_can_be_deleted_and_purchased() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dune_on_server()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/purchase/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 900, "titol": "Dune", "isbn": DUNE_ISBN, "llegit": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server).await;
    let local_id = engine.add_or_update(dune()).await.unwrap();
    {
        let rows = engine.observe_all().borrow().clone();
        assert_eq!(rows[0].remote_id, Some(42));
        assert!(!rows[0].pending_sync);
    }

    let book = engine.purchase(local_id).await.unwrap();
    assert_eq!(book.remote_id, Some(900));
    assert!(engine.observe_all().borrow().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_remote_delete_is_retried_by_sync() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dune_on_server()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/wishlist/42"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/wishlist/deleteMany"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wishlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let engine = engine(&server).await;
    let local_id = engine.add_or_update(dune()).await.unwrap();

    engine.delete(local_id).await.unwrap();
    assert!(engine.observe_all().borrow().is_empty());

    let report = engine.sync().await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.pull, PullOutcome::Replaced { rows: 0 });
    assert!(engine.observe_all().borrow().is_empty());
}
