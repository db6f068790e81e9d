//! Checksum-guarded catalog commits.
//!
//! Two writers race to persist catalogs: the daily full rebuild and the
//! frequent incremental refresh. Every commit runs under one lock spanning
//! read-token, write and publish, and incremental commits only write when the
//! stored token still matches the token of the catalog they were computed
//! from. A full rebuild therefore always wins, and a stale incremental is
//! replaced by whatever the store holds.

mod checksum;

use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use checksum::{checksum, ChecksumToken};

use crate::interfaces::{CatalogStore, StorageError};
use crate::model::Catalog;

/// Errors that can occur while committing a catalog.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Checksum serialization failed: {0}")]
    Checksum(#[from] serde_json::Error),
}

/// Result type for commit operations.
pub type Result<T> = std::result::Result<T, CommitError>;

/// Reference cell holding the latest committed catalog.
///
/// Reads are lock-free. Only the commit protocol replaces the value.
pub struct CatalogCell {
    current: ArcSwap<Catalog>,
}

impl CatalogCell {
    pub fn new(initial: Arc<Catalog>) -> Self {
        Self {
            current: ArcSwap::new(initial),
        }
    }

    /// Latest committed snapshot.
    pub fn load(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    fn publish(&self, catalog: Arc<Catalog>) {
        self.current.store(catalog);
    }
}

impl Default for CatalogCell {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::empty()))
    }
}

/// Performs OCC-guarded writes and publishes the result.
pub struct ChecksumCommitter {
    store: Arc<dyn CatalogStore>,
    current: Arc<CatalogCell>,
    write_lock: Mutex<()>,
}

impl ChecksumCommitter {
    pub fn new(store: Arc<dyn CatalogStore>, current: Arc<CatalogCell>) -> Self {
        Self {
            store,
            current,
            write_lock: Mutex::new(()),
        }
    }

    /// The cell this committer publishes into.
    pub fn cell(&self) -> &Arc<CatalogCell> {
        &self.current
    }

    /// Commit an incrementally updated catalog computed from `baseline`.
    ///
    /// Returns the catalog that is current afterwards: `candidate` when it
    /// was written (or nothing needed writing), otherwise the snapshot
    /// reloaded from the store.
    pub async fn commit_incremental(
        &self,
        candidate: Arc<Catalog>,
        baseline: &Catalog,
    ) -> Result<Arc<Catalog>> {
        let new_token = checksum(&candidate)?;
        let base_token = checksum(baseline)?;
        if new_token == base_token {
            debug!(token = %new_token, "Incremental candidate unchanged, skipping write");
            return Ok(candidate);
        }

        let _guard = self.write_lock.lock().await;

        let stored_token = self.store.current_token().await?;
        let baseline_is_stored = match &stored_token {
            Some(stored) => *stored == base_token,
            None => baseline.is_empty(),
        };

        if baseline_is_stored {
            self.store.write(&candidate, &new_token).await?;
            self.current.publish(Arc::clone(&candidate));
            info!(
                token = %new_token,
                releases = candidate.release_count(),
                "Committed incremental catalog update"
            );
            return Ok(candidate);
        }

        warn!(
            baseline = %base_token,
            stored = ?stored_token.as_ref().map(ChecksumToken::as_str),
            "Store changed since incremental baseline, discarding candidate"
        );

        let Some(reloaded) = self.store.read_catalog().await? else {
            // Nothing stored to defer to.
            self.store.write(&candidate, &new_token).await?;
            self.current.publish(Arc::clone(&candidate));
            return Ok(candidate);
        };

        let reloaded_token = checksum(&reloaded)?;
        if stored_token.as_ref() != Some(&reloaded_token) {
            warn!(
                recomputed = %reloaded_token,
                "Stored checksum does not match stored catalog, re-persisting"
            );
            self.store.write(&reloaded, &reloaded_token).await?;
        }

        let reloaded = Arc::new(reloaded);
        self.current.publish(Arc::clone(&reloaded));
        Ok(reloaded)
    }

    /// Commit a full rebuild unconditionally.
    pub async fn commit_full(&self, fresh: Arc<Catalog>) -> Result<Arc<Catalog>> {
        let _guard = self.write_lock.lock().await;

        let token = checksum(&fresh)?;
        self.store.write(&fresh, &token).await?;
        self.current.publish(Arc::clone(&fresh));
        info!(
            token = %token,
            versions = fresh.feature_releases.len(),
            releases = fresh.release_count(),
            "Committed full catalog rebuild"
        );
        Ok(fresh)
    }
}
