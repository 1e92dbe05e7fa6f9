//! Store Lifecycle Integration Tests
//!
//! Initialization, reset, and what happens to fetches that straddle a reset.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;

use common::*;
use contentstore::{ContentStore, FetchError, InitError, Lifecycle, ResourceType};

#[tokio::test]
async fn test_fetch_before_initialize_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = ContentStore::new(transport.clone());
    assert_eq!(store.lifecycle(), Lifecycle::Uninitialized);

    let err = store
        .objects_of_type(ResourceType::Video, &[APRIL_VIDEO], None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotReady(Lifecycle::Uninitialized)));

    let err = store.search("earth").await.unwrap_err();
    assert!(matches!(err, FetchError::NotReady(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_initialize_loads_view_table() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = ContentStore::new(transport);

    let config = assert_ok!(store.initialize().await);
    assert_eq!(config.view_names(), vec!["homepage", "menu", "splash"]);
    assert_eq!(config.id_for_view_name("menu"), Some(MENU));
    assert_eq!(store.lifecycle(), Lifecycle::Ready);

    let session = store.session().unwrap();
    assert!(Arc::ptr_eq(&session.config, &config));

    // Re-initializing keeps the session
    let again = store.initialize().await.unwrap();
    assert!(Arc::ptr_eq(&again, &config));
    assert_eq!(store.session().unwrap().id, session.id);
}

#[tokio::test]
async fn test_failed_initialize_keeps_state() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_failing(true);
    let store = ContentStore::new(transport.clone());

    let err = store.initialize().await.unwrap_err();
    assert!(matches!(err, InitError::Transport(_)));
    assert_eq!(store.lifecycle(), Lifecycle::Uninitialized);
    assert!(store.config().is_none());

    transport.set_failing(false);
    store.initialize().await.unwrap();
    assert_eq!(store.lifecycle(), Lifecycle::Ready);
}

#[tokio::test]
async fn test_unknown_view_name() {
    let (store, transport) = ready_store().await;

    let err = store.fetch_view("settings", None).await.unwrap_err();
    assert!(matches!(err, FetchError::UnknownView(ref name) if name == "settings"));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_reset_clears_cache_and_requires_initialize() {
    let (store, transport) = ready_store().await;
    store.fetch_view("homepage", None).await.unwrap();
    let first_session = store.session().unwrap().id;

    store.reset_store();
    assert_eq!(store.lifecycle(), Lifecycle::Reset);
    assert!(store.cache().is_empty());
    assert!(store.config().is_none());

    let err = store.fetch_view("homepage", None).await.unwrap_err();
    assert!(matches!(err, FetchError::NotReady(Lifecycle::Reset)));

    store.initialize().await.unwrap();
    assert_ne!(store.session().unwrap().id, first_session);

    store.fetch_view("homepage", None).await.unwrap();
    assert_eq!(store.cache().len(), 1);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_reset_before_initialize_stays_uninitialized() {
    let store = ContentStore::new(Arc::new(ScriptedTransport::new()));
    store.reset_store();
    assert_eq!(store.lifecycle(), Lifecycle::Uninitialized);
}

#[tokio::test]
async fn test_fetch_in_flight_during_reset_is_not_committed() {
    let (store, transport) = ready_store().await;
    transport.set_delay(Duration::from_millis(50));

    let pending = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .objects_of_type(ResourceType::Video, &[APRIL_VIDEO], None)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    store.reset_store();
    store.initialize().await.unwrap();

    // The caller still gets its objects, but the new session's cache stays clean
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome.ids(), vec![APRIL_VIDEO]);
    assert!(store.cache().is_empty());
}

#[tokio::test]
async fn test_media_objects_snapshot() {
    let (store, _transport) = ready_store().await;
    store
        .objects_of_type(ResourceType::Collection, &[MENU_COLLECTION], Some("entities"))
        .await
        .unwrap();

    let mut ids: Vec<String> = store
        .media_objects()
        .iter()
        .map(|object| object.id().to_string())
        .collect();
    ids.sort();

    let mut expected: Vec<String> = MENU_ENTITIES.iter().map(|id| id.to_string()).collect();
    expected.push(MENU_COLLECTION.to_string());
    expected.sort();

    assert_eq!(ids, expected);
}
