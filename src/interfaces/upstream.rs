//! UpstreamClient trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ReleaseId;

/// Errors surfaced by an upstream client after its own retries.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("No upstream repositories configured for feature version {0}")]
    UnknownVersion(u32),

    #[error("Invalid release id: {0}")]
    InvalidReleaseId(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

impl UpstreamError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            UpstreamError::Status { status, .. } => *status >= 500,
            UpstreamError::RateLimited(_) | UpstreamError::Unavailable(_) => true,
            UpstreamError::Malformed(_)
            | UpstreamError::UnknownVersion(_)
            | UpstreamError::InvalidReleaseId(_) => false,
        }
    }
}

/// Result type for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Lightweight listing entry: enough to decide whether a release changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub id: ReleaseId,
    pub updated_at: DateTime<Utc>,
}

/// Asset attached to an upstream release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAsset {
    pub name: String,
    pub download_url: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Full upstream release object, before mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelease {
    pub id: ReleaseId,
    pub tag_name: String,
    pub name: String,
    pub url: String,
    pub prerelease: bool,
    pub draft: bool,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assets: Vec<RawAsset>,
}

/// Result of fetching a single release by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(RawRelease),
    /// The id vanished between listing and fetch.
    NotFound,
}

/// Interface to the upstream release host.
///
/// Implementations own pagination, rate limiting and retries. An error
/// returned here has already exhausted those.
///
/// # Implementations
///
/// - `GithubUpstreamClient`: GitHub REST releases API
/// - `MockUpstreamClient`: In-memory mock for testing
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// List `(id, updated_at)` for every release of a feature version,
    /// across all of its source repositories.
    async fn get_summary(&self, feature_version: u32) -> Result<Vec<ReleaseSummary>>;

    /// Fetch one release.
    async fn get_release_by_id(&self, id: &ReleaseId) -> Result<FetchOutcome>;
}
