//! Test utilities and mock implementations.
//!
//! This module provides a scriptable upstream client, a manual clock and
//! builders for releases and catalogs, so reconciliation and scheduling can
//! be tested without network access.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use crate::interfaces::upstream::{
    FetchOutcome, RawAsset, RawRelease, ReleaseSummary, Result as UpstreamResult,
    UpstreamClient, UpstreamError,
};
use crate::interfaces::ReleaseMapper;
use crate::mapper::DefaultReleaseMapper;
use crate::model::{Catalog, FeatureRelease, Release, ReleaseId};
use crate::reconciler::Clock;

/// Epoch all test timestamps are relative to.
const BASE_TIMESTAMP: i64 = 1_700_000_000;

/// Timestamp `secs` seconds after the test epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_TIMESTAMP + secs, 0).unwrap_or_default()
}

/// Upstream release with a single asset.
pub fn raw_release(
    id: &str,
    tag: &str,
    published_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> RawRelease {
    RawRelease {
        id: ReleaseId::new(id),
        tag_name: tag.to_string(),
        name: tag.to_string(),
        url: format!("https://example.test/releases/{id}"),
        prerelease: false,
        draft: false,
        published_at,
        updated_at,
        assets: vec![RawAsset {
            name: format!("{tag}-x64_linux.tar.gz"),
            download_url: format!("https://example.test/download/{id}/x64_linux.tar.gz"),
            size: 1024,
            content_type: Some("application/gzip".to_string()),
            updated_at,
        }],
    }
}

/// Mapped release published and updated at the test epoch.
pub fn release(id: &str, tag: &str) -> Release {
    DefaultReleaseMapper::new("eclipse")
        .to_release(&raw_release(id, tag, ts(0), ts(0)))
        .unwrap_or_else(|e| panic!("test release {id} must map: {e}"))
}

/// Catalog holding one feature version.
pub fn catalog_of(feature_version: u32, releases: Vec<Release>) -> Catalog {
    Catalog::new([FeatureRelease::new(feature_version, releases)])
}

/// Clock that only moves when told to.
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.millis.store(now.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: TimeDelta) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Upstream client backed by in-memory releases, with failure injection and
/// a log of per-id fetches.
#[derive(Default)]
pub struct MockUpstreamClient {
    releases: RwLock<BTreeMap<u32, BTreeMap<ReleaseId, RawRelease>>>,
    failing_summaries: RwLock<HashSet<u32>>,
    failing_fetches: RwLock<HashSet<ReleaseId>>,
    vanished: RwLock<HashSet<ReleaseId>>,
    fetches: RwLock<HashMap<ReleaseId, usize>>,
}

impl MockUpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a release under a feature version.
    pub async fn put_release(&self, feature_version: u32, raw: RawRelease) {
        self.releases
            .write()
            .await
            .entry(feature_version)
            .or_default()
            .insert(raw.id.clone(), raw);
    }

    pub async fn remove_release(&self, id: &str) {
        let id = ReleaseId::new(id);
        for releases in self.releases.write().await.values_mut() {
            releases.remove(&id);
        }
    }

    pub async fn set_fail_summary(&self, feature_version: u32, fail: bool) {
        let mut failing = self.failing_summaries.write().await;
        if fail {
            failing.insert(feature_version);
        } else {
            failing.remove(&feature_version);
        }
    }

    pub async fn set_fail_fetch(&self, id: &str, fail: bool) {
        let mut failing = self.failing_fetches.write().await;
        if fail {
            failing.insert(ReleaseId::new(id));
        } else {
            failing.remove(&ReleaseId::new(id));
        }
    }

    /// Keep listing `id` but answer not-found when it is fetched.
    pub async fn set_vanished(&self, id: &str) {
        self.vanished.write().await.insert(ReleaseId::new(id));
    }

    /// How many times `id` was fetched.
    pub async fn fetch_count(&self, id: &str) -> usize {
        self.fetches
            .read()
            .await
            .get(&ReleaseId::new(id))
            .copied()
            .unwrap_or(0)
    }

    /// Total fetches across all ids.
    pub async fn total_fetches(&self) -> usize {
        self.fetches.read().await.values().sum()
    }

    pub async fn clear_fetch_log(&self) {
        self.fetches.write().await.clear();
    }
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn get_summary(&self, feature_version: u32) -> UpstreamResult<Vec<ReleaseSummary>> {
        if self.failing_summaries.read().await.contains(&feature_version) {
            return Err(UpstreamError::Unavailable(format!(
                "summary failure injected for {feature_version}"
            )));
        }
        Ok(self
            .releases
            .read()
            .await
            .get(&feature_version)
            .map(|releases| {
                releases
                    .values()
                    .map(|raw| ReleaseSummary {
                        id: raw.id.clone(),
                        updated_at: raw.updated_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_release_by_id(&self, id: &ReleaseId) -> UpstreamResult<FetchOutcome> {
        *self.fetches.write().await.entry(id.clone()).or_default() += 1;

        if self.failing_fetches.read().await.contains(id) {
            return Err(UpstreamError::Unavailable(format!(
                "fetch failure injected for {id}"
            )));
        }
        if self.vanished.read().await.contains(id) {
            return Ok(FetchOutcome::NotFound);
        }
        let found = self
            .releases
            .read()
            .await
            .values()
            .find_map(|releases| releases.get(id).cloned());
        Ok(found.map_or(FetchOutcome::NotFound, FetchOutcome::Found))
    }
}
