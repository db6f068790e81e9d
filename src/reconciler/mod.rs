//! Catalog reconciliation against upstream state.
//!
//! ## Incremental update
//!
//! For each feature version the reconciler lists `(id, updated_at)` pairs,
//! prunes stored releases that are no longer listed, and fetches only the
//! releases that are new, changed, or still young. Everything else is carried
//! over untouched, so a cycle with no upstream change yields a catalog equal
//! to its input.
//!
//! ## Full rebuild
//!
//! `build` ignores the previous catalog, clears the exclusion set and fetches
//! every listed release.
//!
//! ## Poison records
//!
//! Releases that fail mapping are remembered in the [`ExclusionSet`] and not
//! fetched again until the next full rebuild.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::interfaces::{
    FetchOutcome, MapError, ReleaseMapper, ReleaseSummary, UpstreamClient, UpstreamError,
};
use crate::model::{Catalog, FeatureRelease, Release, ReleaseId};

/// Errors that abort a full rebuild.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Listing feature version {version} failed: {source}")]
    Summary {
        version: u32,
        #[source]
        source: UpstreamError,
    },
}

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Release ids that failed mapping during this reconciler's lifetime.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    ids: RwLock<HashSet<ReleaseId>>,
}

impl ExclusionSet {
    pub async fn contains(&self, id: &ReleaseId) -> bool {
        self.ids.read().await.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.ids.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ids.read().await.is_empty()
    }

    async fn insert(&self, id: ReleaseId) {
        self.ids.write().await.insert(id);
    }

    async fn snapshot(&self) -> HashSet<ReleaseId> {
        self.ids.read().await.clone()
    }

    async fn clear(&self) {
        self.ids.write().await.clear();
    }
}

/// Outcome of fetching and mapping one release.
enum FetchResult {
    Mapped(Release),
    /// Listed in the summary but gone by the time it was fetched.
    NotFound,
    /// Permanent for this reconciler: feeds the exclusion set.
    Unmappable(MapError),
    /// Retried on a later cycle.
    Failed(UpstreamError),
}

/// Computes new catalog snapshots from upstream state.
pub struct CatalogReconciler {
    upstream: Arc<dyn UpstreamClient>,
    mapper: Arc<dyn ReleaseMapper>,
    clock: Arc<dyn Clock>,
    tracked_versions: Vec<u32>,
    young_release_grace: TimeDelta,
    max_concurrent_fetches: usize,
    excluded: ExclusionSet,
}

impl CatalogReconciler {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        mapper: Arc<dyn ReleaseMapper>,
        config: &ReconcilerConfig,
    ) -> Self {
        Self {
            upstream,
            mapper,
            clock: Arc::new(SystemClock),
            tracked_versions: config.versions.clone(),
            young_release_grace: to_time_delta(config.young_release_grace()),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
            excluded: ExclusionSet::default(),
        }
    }

    /// Replace the clock used for the young-release rule.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Feature versions refreshed even when absent from the previous catalog.
    pub fn tracked_versions(&self) -> &[u32] {
        &self.tracked_versions
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.excluded
    }

    /// Compute the next snapshot from `previous`, fetching only what changed.
    ///
    /// Never fails: a feature version whose listing fails is carried over
    /// unchanged, and per-release failures leave the stored release in place.
    pub async fn incremental_update(&self, previous: &Catalog) -> Catalog {
        let versions: BTreeSet<u32> = previous
            .versions()
            .chain(self.tracked_versions.iter().copied())
            .collect();

        let refreshed = futures::future::join_all(
            versions
                .iter()
                .map(|version| self.refresh_version(*version, previous.get(*version))),
        )
        .await;

        Catalog::new(refreshed.into_iter().flatten())
    }

    /// Rebuild the catalog for `versions` from scratch.
    ///
    /// Clears the exclusion set first, so previously unmappable releases get
    /// another attempt.
    pub async fn build(&self, versions: &[u32]) -> Result<Catalog, ReconcileError> {
        self.excluded.clear().await;

        let built =
            futures::future::join_all(versions.iter().map(|version| self.build_version(*version)))
                .await;

        let mut feature_releases = Vec::with_capacity(built.len());
        for result in built {
            if let Some(feature_release) = result? {
                feature_releases.push(feature_release);
            }
        }

        let catalog = Catalog::new(feature_releases);
        let excluded = self.excluded.len().await;
        info!(
            versions = catalog.feature_releases.len(),
            releases = catalog.release_count(),
            excluded,
            "Full catalog rebuild computed"
        );
        Ok(catalog)
    }

    async fn refresh_version(
        &self,
        version: u32,
        existing: Option<&FeatureRelease>,
    ) -> Option<FeatureRelease> {
        let summary = match self.upstream.get_summary(version).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(version, error = %e, "Listing failed, keeping feature version unchanged");
                return existing.cloned();
            }
        };

        let listed: HashSet<&ReleaseId> = summary.iter().map(|s| &s.id).collect();
        let mut releases: BTreeMap<ReleaseId, Release> = existing
            .map(|fr| {
                fr.releases
                    .iter()
                    .filter(|(id, _)| listed.contains(id))
                    .map(|(id, release)| (id.clone(), release.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let pruned = existing.map_or(0, FeatureRelease::len) - releases.len();

        let excluded = self.excluded.snapshot().await;
        let now = self.clock.now();
        let to_fetch: Vec<ReleaseId> = summary
            .iter()
            .filter(|entry| !excluded.contains(&entry.id))
            .filter(|entry| self.needs_fetch(entry, releases.get(&entry.id), now))
            .map(|entry| entry.id.clone())
            .collect();

        let fetched = to_fetch.len();
        for (id, result) in self.fetch_all(to_fetch).await {
            match result {
                FetchResult::Mapped(release) => {
                    releases.insert(id, release);
                }
                FetchResult::NotFound => {
                    debug!(version, id = %id, "Release vanished before fetch");
                    releases.remove(&id);
                }
                FetchResult::Unmappable(e) => {
                    warn!(version, id = %id, error = %e, "Excluding unmappable release");
                    self.excluded.insert(id).await;
                }
                FetchResult::Failed(e) => {
                    warn!(version, id = %id, error = %e, "Release fetch failed, retrying next cycle");
                }
            }
        }

        if pruned > 0 || fetched > 0 {
            debug!(version, pruned, fetched, releases = releases.len(), "Feature version refreshed");
        }

        if existing.is_none() && releases.is_empty() {
            return None;
        }
        Some(FeatureRelease {
            feature_version: version,
            releases,
        })
    }

    async fn build_version(&self, version: u32) -> Result<Option<FeatureRelease>, ReconcileError> {
        let summary = self
            .upstream
            .get_summary(version)
            .await
            .map_err(|source| ReconcileError::Summary { version, source })?;

        let ids = summary.into_iter().map(|entry| entry.id).collect();
        let mut releases = BTreeMap::new();
        for (id, result) in self.fetch_all(ids).await {
            match result {
                FetchResult::Mapped(release) => {
                    releases.insert(id, release);
                }
                FetchResult::NotFound => {}
                FetchResult::Unmappable(e) => {
                    warn!(version, id = %id, error = %e, "Excluding unmappable release");
                    self.excluded.insert(id).await;
                }
                FetchResult::Failed(e) => {
                    warn!(version, id = %id, error = %e, "Release fetch failed during rebuild");
                }
            }
        }

        if releases.is_empty() {
            return Ok(None);
        }
        Ok(Some(FeatureRelease {
            feature_version: version,
            releases,
        }))
    }

    /// New, changed, or young releases need fetching.
    fn needs_fetch(
        &self,
        entry: &ReleaseSummary,
        stored: Option<&Release>,
        now: DateTime<Utc>,
    ) -> bool {
        match stored {
            None => true,
            Some(stored) => stored.updated_at != entry.updated_at || self.is_young(stored, now),
        }
    }

    /// Binaries of a just-published release may still be uploading.
    fn is_young(&self, release: &Release, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(release.published_at) < self.young_release_grace
    }

    async fn fetch_all(&self, ids: Vec<ReleaseId>) -> Vec<(ReleaseId, FetchResult)> {
        stream::iter(ids)
            .map(|id| async move {
                let result = self.fetch(&id).await;
                (id, result)
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await
    }

    async fn fetch(&self, id: &ReleaseId) -> FetchResult {
        match self.upstream.get_release_by_id(id).await {
            Ok(FetchOutcome::Found(raw)) => match self.mapper.to_release(&raw) {
                Ok(release) => FetchResult::Mapped(release),
                Err(e) => FetchResult::Unmappable(e),
            },
            Ok(FetchOutcome::NotFound) => FetchResult::NotFound,
            Err(e) => FetchResult::Failed(e),
        }
    }
}

fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
