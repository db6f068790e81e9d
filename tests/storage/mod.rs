//! Shared storage integration tests.
//!
//! Tests the CatalogStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod catalog_store_tests;
