//! CatalogStore interface tests.
//!
//! These tests verify the contract of the CatalogStore trait.
//! Each storage implementation should run these tests. Stores hold a single
//! record, so every test takes a freshly created store.

use catalog_sync::committer::{checksum, ChecksumToken};
use catalog_sync::interfaces::CatalogStore;
use catalog_sync::model::Catalog;
use catalog_sync::test_utils::{catalog_of, release};

pub fn small_catalog() -> Catalog {
    catalog_of(11, vec![release("a", "jdk-11.0.4+11")])
}

pub fn larger_catalog() -> Catalog {
    let mut catalog = catalog_of(
        11,
        vec![
            release("a", "jdk-11.0.4+11"),
            release("b", "jdk-11.0.5+10"),
        ],
    );
    let other = catalog_of(8, vec![release("c", "jdk8u212-b03")]);
    catalog.feature_releases.extend(other.feature_releases);
    catalog
}

// =============================================================================
// Empty store
// =============================================================================

pub async fn test_empty_store<S: CatalogStore>(store: &S) {
    assert!(store.current_token().await.expect("token read").is_none());
    assert!(store.read_catalog().await.expect("catalog read").is_none());
    assert!(store.last_updated().await.expect("timestamp read").is_none());
}

// =============================================================================
// Writes
// =============================================================================

pub async fn test_write_then_read<S: CatalogStore>(store: &S) {
    let catalog = larger_catalog();
    let token = checksum(&catalog).expect("checksum");

    store.write(&catalog, &token).await.expect("write");

    assert_eq!(store.current_token().await.unwrap(), Some(token));
    assert_eq!(store.read_catalog().await.unwrap(), Some(catalog));
    assert!(store.last_updated().await.unwrap().is_some());
}

pub async fn test_overwrite_replaces_record<S: CatalogStore>(store: &S) {
    let first = small_catalog();
    let second = larger_catalog();

    store
        .write(&first, &checksum(&first).unwrap())
        .await
        .expect("first write");
    store
        .write(&second, &checksum(&second).unwrap())
        .await
        .expect("second write");

    assert_eq!(
        store.current_token().await.unwrap(),
        Some(checksum(&second).unwrap())
    );
    assert_eq!(store.read_catalog().await.unwrap(), Some(second));
}

pub async fn test_token_stored_as_given<S: CatalogStore>(store: &S) {
    let catalog = small_catalog();
    let token = ChecksumToken::new("not-the-real-digest");

    store.write(&catalog, &token).await.expect("write");

    assert_eq!(store.current_token().await.unwrap(), Some(token));
    assert_eq!(store.read_catalog().await.unwrap(), Some(catalog));
}

pub async fn test_last_updated_moves_forward<S: CatalogStore>(store: &S) {
    let catalog = small_catalog();
    let token = checksum(&catalog).unwrap();

    store.write(&catalog, &token).await.unwrap();
    let first = store.last_updated().await.unwrap().expect("timestamp");
    store.write(&catalog, &token).await.unwrap();
    let second = store.last_updated().await.unwrap().expect("timestamp");

    assert!(second >= first);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all CatalogStore interface tests, creating a fresh store for each.
#[macro_export]
macro_rules! run_catalog_store_tests {
    ($make_store:expr) => {
        use $crate::storage::catalog_store_tests::*;

        test_empty_store(&$make_store).await;
        println!("  test_empty_store: PASSED");

        test_write_then_read(&$make_store).await;
        println!("  test_write_then_read: PASSED");

        test_overwrite_replaces_record(&$make_store).await;
        println!("  test_overwrite_replaces_record: PASSED");

        test_token_stored_as_given(&$make_store).await;
        println!("  test_token_stored_as_given: PASSED");

        test_last_updated_moves_forward(&$make_store).await;
        println!("  test_last_updated_moves_forward: PASSED");
    };
}
