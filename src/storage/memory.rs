//! In-memory catalog store.
//!
//! Used for ephemeral runs and as the test double for the commit protocol.
//! Failure injection and write counting let tests observe OCC decisions.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::committer::ChecksumToken;
use crate::interfaces::catalog_store::{CatalogStore, Result, StorageError};
use crate::model::Catalog;

struct StoredRecord {
    catalog: Catalog,
    token: ChecksumToken,
    updated_at: DateTime<Utc>,
}

/// Catalog store that keeps its single record in memory.
#[derive(Default)]
pub struct MemoryCatalogStore {
    record: RwLock<Option<StoredRecord>>,
    writes: AtomicUsize,
    fail_on_write: RwLock<bool>,
    fail_on_read: RwLock<bool>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Replace the recorded token without touching the stored catalog.
    ///
    /// Simulates a token that drifted from its catalog. No-op when empty.
    pub async fn set_token(&self, token: ChecksumToken) {
        if let Some(record) = self.record.write().await.as_mut() {
            record.token = token;
        }
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable("read failure injected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn current_token(&self) -> Result<Option<ChecksumToken>> {
        self.check_read().await?;
        Ok(self.record.read().await.as_ref().map(|r| r.token.clone()))
    }

    async fn write(&self, catalog: &Catalog, token: &ChecksumToken) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable("write failure injected".to_string()));
        }
        *self.record.write().await = Some(StoredRecord {
            catalog: catalog.clone(),
            token: token.clone(),
            updated_at: Utc::now(),
        });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_catalog(&self) -> Result<Option<Catalog>> {
        self.check_read().await?;
        Ok(self.record.read().await.as_ref().map(|r| r.catalog.clone()))
    }

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        self.check_read().await?;
        Ok(self.record.read().await.as_ref().map(|r| r.updated_at))
    }
}
