//! Catalog data model.
//!
//! A [`Catalog`] is an immutable snapshot of every tracked feature version.
//! Snapshots are shared as `Arc<Catalog>` and replaced wholesale, never
//! mutated in place. All maps are ordered so that serialization (and with it
//! the checksum token) is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::VersionData;

/// Opaque upstream identifier of a release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReleaseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// General availability or early access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    Ga,
    Ea,
}

/// One downloadable asset of a release, as published upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    pub name: String,
    pub link: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One published binary set for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub release_kind: ReleaseKind,
    pub name: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vendor: String,
    pub version_data: VersionData,
    pub binaries: Vec<Binary>,
}

/// Every release of one feature version, merged across source repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRelease {
    pub feature_version: u32,
    pub releases: BTreeMap<ReleaseId, Release>,
}

impl FeatureRelease {
    pub fn new(feature_version: u32, releases: impl IntoIterator<Item = Release>) -> Self {
        Self {
            feature_version,
            releases: releases.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn get(&self, id: &ReleaseId) -> Option<&Release> {
        self.releases.get(id)
    }

    pub fn contains(&self, id: &ReleaseId) -> bool {
        self.releases.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Newest release by version order, optionally restricted to one kind.
    pub fn latest(&self, kind: Option<ReleaseKind>) -> Option<&Release> {
        self.releases
            .values()
            .filter(|r| kind.is_none_or(|k| r.release_kind == k))
            .max_by(|a, b| a.version_data.cmp(&b.version_data))
    }
}

/// Root aggregate: the whole tracked universe at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub feature_releases: BTreeMap<u32, FeatureRelease>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(feature_releases: impl IntoIterator<Item = FeatureRelease>) -> Self {
        Self {
            feature_releases: feature_releases
                .into_iter()
                .map(|fr| (fr.feature_version, fr))
                .collect(),
        }
    }

    pub fn get(&self, feature_version: u32) -> Option<&FeatureRelease> {
        self.feature_releases.get(&feature_version)
    }

    /// Feature versions present in this snapshot, ascending.
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.feature_releases.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_releases.is_empty()
    }

    /// Total number of releases across all feature versions.
    pub fn release_count(&self) -> usize {
        self.feature_releases.values().map(FeatureRelease::len).sum()
    }

    /// Newest release of a feature version.
    pub fn latest_release(
        &self,
        feature_version: u32,
        kind: Option<ReleaseKind>,
    ) -> Option<&Release> {
        self.get(feature_version)?.latest(kind)
    }
}
