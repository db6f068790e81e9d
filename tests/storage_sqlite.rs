//! SQLite storage integration tests.
//!
//! Run with: cargo test --test storage_sqlite --features sqlite
//!
//! Uses in-memory databases and temp files, no external dependencies required.

#![cfg(feature = "sqlite")]

mod storage;

use sqlx::sqlite::SqlitePoolOptions;

use catalog_sync::committer::checksum;
use catalog_sync::interfaces::CatalogStore;
use catalog_sync::storage::SqliteCatalogStore;

/// Fresh store on its own in-memory database.
async fn fresh_store() -> SqliteCatalogStore {
    // One connection: every connection to sqlite::memory: is a new database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");

    let store = SqliteCatalogStore::new(pool);
    store.init().await.expect("Failed to create schema");
    store
}

#[tokio::test]
async fn test_sqlite_catalog_store() {
    println!("=== SQLite CatalogStore Tests ===");

    run_catalog_store_tests!(fresh_store().await);

    println!("=== All SQLite CatalogStore tests PASSED ===");
}

#[tokio::test]
async fn test_sqlite_catalog_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("catalog.db");
    let path = path.to_str().expect("utf-8 path");
    let catalog = storage::catalog_store_tests::larger_catalog();
    let token = checksum(&catalog).unwrap();

    {
        let store = SqliteCatalogStore::connect(path).await.expect("connect");
        store.write(&catalog, &token).await.expect("write");
    }

    let reopened = SqliteCatalogStore::connect(path).await.expect("reopen");
    assert_eq!(reopened.current_token().await.unwrap(), Some(token));
    assert_eq!(reopened.read_catalog().await.unwrap(), Some(catalog));
}
