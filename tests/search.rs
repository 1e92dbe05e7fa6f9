//! Search Integration Tests

mod common;

use common::*;
use contentstore::{FetchError, ResourceType};

#[tokio::test]
async fn test_search_splits_results_by_type() {
    let (store, transport) = ready_store().await;

    let results = store.search("earth").await.unwrap();

    assert_eq!(results.videos.len(), 4);
    assert_eq!(results.collections.len(), 1);
    assert_eq!(results.len(), 5);
    assert!(results.errors.is_empty());

    let video_ids: Vec<&str> = results.videos.iter().map(|v| v.id()).collect();
    assert_eq!(video_ids, SEARCH_VIDEOS.to_vec());
    assert_eq!(results.collections[0].title(), Some("Earth Science"));

    assert_eq!(transport.searches(), vec!["earth"]);
}

#[tokio::test]
async fn test_search_results_are_cached() {
    let (store, transport) = ready_store().await;

    store.search("earth").await.unwrap();
    assert_eq!(store.cache().len(), 5);
    assert_eq!(store.cache().of_type(ResourceType::Video).len(), 4);

    // Served from cache afterwards
    let outcome = store
        .objects_of_type(ResourceType::Video, &SEARCH_VIDEOS, None)
        .await
        .unwrap();
    assert_eq!(outcome.objects.len(), 4);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_search_replaces_cached_entries_by_id() {
    let (store, _transport) = ready_store().await;

    let before = store
        .objects_of_type(ResourceType::Video, &[FEATURED_VIDEO], None)
        .await
        .unwrap();
    let results = store.search("earth").await.unwrap();

    assert_eq!(store.cache().of_type(ResourceType::Video).len(), 4);
    let cached = store.cache().get(FEATURED_VIDEO).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&before.objects[0], &cached));
    assert!(results.videos.iter().any(|v| std::sync::Arc::ptr_eq(v, &cached)));
}

#[tokio::test]
async fn test_blank_term_skips_request() {
    let (store, transport) = ready_store().await;

    let results = store.search("   ").await.unwrap();

    assert!(results.is_empty());
    assert!(transport.searches().is_empty());
}

#[tokio::test]
async fn test_no_matches() {
    let (store, _transport) = ready_store().await;

    let results = store.search("jupiter").await.unwrap();
    assert!(results.is_empty());
    assert!(store.cache().is_empty());
}

#[tokio::test]
async fn test_search_transport_failure() {
    let (store, transport) = ready_store().await;
    transport.set_failing(true);

    let err = store.search("earth").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert!(store.cache().is_empty());
}
