//! Timer-driven catalog synchronization.
//!
//! Two background loops keep the catalog current:
//!
//! - **Full**: rebuilds every tracked feature version from scratch and
//!   commits unconditionally.
//! - **Incremental**: refreshes the current snapshot and commits under the
//!   checksum guard, deferring to anything written in the meantime.
//!
//! Each loop runs its cycle to completion before waiting for the next tick.
//! The loops are independent, so a full rebuild and an incremental refresh
//! may overlap; the committer serializes their writes.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::committer::{CatalogCell, ChecksumCommitter, CommitError};
use crate::config::SchedulerConfig;
use crate::interfaces::CatalogStore;
use crate::model::Catalog;
use crate::reconciler::{CatalogReconciler, ReconcileError};

/// Shortest period either loop will tick at.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Errors from a single synchronization cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Commit failed: {0}")]
    Commit(#[from] CommitError),
}

/// Result type for synchronization cycles.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Owns the current catalog and drives the update loops.
#[derive(Clone)]
pub struct SyncScheduler {
    cell: Arc<CatalogCell>,
    reconciler: Arc<CatalogReconciler>,
    committer: Arc<ChecksumCommitter>,
    config: SchedulerConfig,
}

impl SyncScheduler {
    /// Create a scheduler seeded with the stored catalog.
    ///
    /// Starts from an empty catalog when the store is empty or unreadable;
    /// the first full rebuild fills it in.
    pub async fn new(
        store: Arc<dyn CatalogStore>,
        reconciler: CatalogReconciler,
        config: SchedulerConfig,
    ) -> Self {
        let initial = match store.read_catalog().await {
            Ok(Some(catalog)) => {
                info!(
                    versions = catalog.feature_releases.len(),
                    releases = catalog.release_count(),
                    "Loaded stored catalog"
                );
                catalog
            }
            Ok(None) => {
                info!("No stored catalog, starting empty");
                Catalog::empty()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load stored catalog, starting empty");
                Catalog::empty()
            }
        };

        let cell = Arc::new(CatalogCell::new(Arc::new(initial)));
        let committer = Arc::new(ChecksumCommitter::new(store, Arc::clone(&cell)));

        Self {
            cell,
            reconciler: Arc::new(reconciler),
            committer,
            config,
        }
    }

    /// Latest committed catalog. Never blocks.
    pub fn current_snapshot(&self) -> Arc<Catalog> {
        self.cell.load()
    }

    pub fn reconciler(&self) -> &CatalogReconciler {
        &self.reconciler
    }

    /// Rebuild every tracked feature version and commit the result.
    pub async fn run_full_once(&self) -> Result<Arc<Catalog>> {
        let fresh = self
            .reconciler
            .build(self.reconciler.tracked_versions())
            .await?;
        Ok(self.committer.commit_full(Arc::new(fresh)).await?)
    }

    /// Refresh the current catalog and commit it if anything changed.
    pub async fn run_incremental_once(&self) -> Result<Arc<Catalog>> {
        let current = self.cell.load();
        let candidate = self.reconciler.incremental_update(&current).await;
        if candidate == *current {
            debug!("Incremental update found no changes");
            return Ok(current);
        }
        Ok(self
            .committer
            .commit_incremental(Arc::new(candidate), &current)
            .await?)
    }

    /// Start both loops in the background.
    ///
    /// Returns a handle that can be used to stop them.
    pub fn spawn(&self) -> SchedulerHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let full = {
            let scheduler = self.clone();
            tokio::spawn(run_loop(
                "full",
                self.config.full_update_delay(),
                self.config.full_update_interval(),
                cancel_rx.clone(),
                move || {
                    let scheduler = scheduler.clone();
                    async move { scheduler.run_full_once().await }
                },
            ))
        };

        let incremental = {
            let scheduler = self.clone();
            tokio::spawn(run_loop(
                "incremental",
                self.config.incremental_delay(),
                self.config.incremental_interval(),
                cancel_rx,
                move || {
                    let scheduler = scheduler.clone();
                    async move { scheduler.run_incremental_once().await }
                },
            ))
        };

        SchedulerHandle {
            cancel: cancel_tx,
            tasks: vec![full, incremental],
        }
    }
}

/// Handle for the spawned update loops.
///
/// Dropping the handle also stops the loops.
pub struct SchedulerHandle {
    cancel: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal both loops to stop after their current cycle.
    pub fn stop(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for both loops to exit.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Scheduler task ended abnormally");
            }
        }
    }
}

async fn run_loop<F, Fut>(
    name: &'static str,
    delay: Duration,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
    mut cycle: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Arc<Catalog>>>,
{
    let period = period.max(MIN_PERIOD);
    let mut ticker = tokio::time::interval_at(Instant::now() + delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        task = name,
        delay_secs = delay.as_secs(),
        period_secs = period.as_secs(),
        "Catalog update loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match AssertUnwindSafe(cycle()).catch_unwind().await {
                    Ok(Ok(catalog)) => {
                        debug!(task = name, releases = catalog.release_count(), "Catalog update finished");
                    }
                    Ok(Err(e)) => {
                        error!(task = name, error = %e, "Catalog update failed");
                    }
                    Err(panic) => {
                        error!(task = name, panic = panic_message(&*panic), "Catalog update panicked");
                    }
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    info!(task = name, "Catalog update loop stopped");
                    break;
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
