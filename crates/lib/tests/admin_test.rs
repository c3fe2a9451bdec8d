//! # Store Administration Tests

use feedvault::admin::{create_index, list_documents, AdminError};
use feedvault::errors::StoreError;
use feedvault_test_utils::{setup_tracing, MockStore, StoreCall};

#[tokio::test]
async fn test_create_index_prints_the_new_id() {
    setup_tracing();
    let store = MockStore::new();
    store.start_store_ids_at(123);
    let mut out = Vec::new();

    let created = create_index(&store, "Publisher Content Store", &mut out)
        .await
        .unwrap();

    assert_eq!(created.id, "vs_123");
    assert_eq!(String::from_utf8(out).unwrap(), "Vector store ID: vs_123\n");
    assert_eq!(
        store.calls(),
        vec![StoreCall::CreateVectorStore {
            name: "Publisher Content Store".to_string()
        }]
    );
}

#[tokio::test]
async fn test_list_documents_prints_one_filename_per_line_in_listing_order() {
    setup_tracing();
    let store = MockStore::new();
    store.seed_store("vs_123", &["A.txt", "B.txt"]);
    let mut out = Vec::new();

    let files = list_documents(&store, &store, "vs_123", &mut out)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "A.txt\nB.txt\n");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].filename, "A.txt");
}

#[tokio::test]
async fn test_list_documents_on_empty_store_prints_nothing() {
    setup_tracing();
    let store = MockStore::new();
    store.seed_store("vs_empty", &[]);
    let mut out = Vec::new();

    let files = list_documents(&store, &store, "vs_empty", &mut out)
        .await
        .unwrap();

    assert!(files.is_empty());
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_list_documents_surfaces_unknown_store() {
    setup_tracing();
    let store = MockStore::new();
    let mut out = Vec::new();

    let err = list_documents(&store, &store, "vs_missing", &mut out)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdminError::Store(StoreError::Api { status: 404, .. })
    ));
}
