//! Catalog Sync - JDK release catalog synchronization
//!
//! Keeps an in-memory, persisted catalog of JDK releases consistent with an
//! upstream release host. Two loops feed it: an incremental refresh that
//! fetches only what changed, and a periodic full rebuild. Writes are
//! guarded by a content checksum so a stale refresh never overwrites a
//! rebuild.

pub mod committer;
pub mod config;
pub mod interfaces;
pub mod mapper;
pub mod model;
pub mod reconciler;
pub mod scheduler;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod upstream;
pub mod utils;
pub mod version;
