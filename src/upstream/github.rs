//! GitHub REST releases client.
//!
//! A feature version maps to one or more repositories (see
//! [`UpstreamConfig::repositories_for`]). Listings are paged until a short
//! page, and release ids are qualified by their repository as
//! `owner/repo/numeric-id` so a single id is enough to fetch the release.

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::interfaces::upstream::{
    FetchOutcome, RawAsset, RawRelease, ReleaseSummary, Result, UpstreamClient, UpstreamError,
};
use crate::model::ReleaseId;
use crate::utils::retry::upstream_backoff;

const GITHUB_JSON: &str = "application/vnd.github+json";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Release object as returned by the releases API.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    id: u64,
    tag_name: String,
    name: Option<String>,
    html_url: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
    size: u64,
    content_type: Option<String>,
    updated_at: DateTime<Utc>,
}

impl GithubRelease {
    fn published(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    /// Releases carry no modification time of their own; re-uploaded assets
    /// are what changes after publication.
    fn updated_at(&self) -> DateTime<Utc> {
        self.assets
            .iter()
            .map(|asset| asset.updated_at)
            .fold(self.published(), Ord::max)
    }

    fn into_raw(self, repository: &str) -> RawRelease {
        let published_at = self.published();
        let updated_at = self.updated_at();
        RawRelease {
            id: release_id(repository, self.id),
            name: self.name.unwrap_or_else(|| self.tag_name.clone()),
            tag_name: self.tag_name,
            url: self.html_url,
            prerelease: self.prerelease,
            draft: self.draft,
            published_at,
            updated_at,
            assets: self
                .assets
                .into_iter()
                .map(|asset| RawAsset {
                    name: asset.name,
                    download_url: asset.browser_download_url,
                    size: asset.size,
                    content_type: asset.content_type,
                    updated_at: asset.updated_at,
                })
                .collect(),
        }
    }
}

fn release_id(repository: &str, numeric: u64) -> ReleaseId {
    ReleaseId::new(format!("{repository}/{numeric}"))
}

/// Split `owner/repo/numeric-id` into repository and numeric id.
fn split_release_id(id: &ReleaseId) -> Result<(&str, u64)> {
    let invalid = || UpstreamError::InvalidReleaseId(id.to_string());
    let (repository, numeric) = id.as_str().rsplit_once('/').ok_or_else(invalid)?;
    if !repository.contains('/') {
        return Err(invalid());
    }
    let numeric = numeric.parse().map_err(|_| invalid())?;
    Ok((repository, numeric))
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && headers
                .get(RATE_LIMIT_REMAINING)
                .and_then(|v| v.to_str().ok())
                == Some("0"))
}

/// [`UpstreamClient`] over the GitHub releases API.
pub struct GithubUpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl GithubUpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    fn api_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    /// GET and decode JSON. `None` on 404.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if is_rate_limited(status, response.headers()) {
            return Err(UpstreamError::RateLimited(url.to_string()));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| UpstreamError::Malformed(format!("{url}: {e}")))
    }

    /// [`Self::get_json`] with backoff on transient failures.
    async fn get_with_retry<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        (|| async { self.get_json(url).await })
            .retry(upstream_backoff(&self.config.retry))
            .when(UpstreamError::is_transient)
            .notify(|e: &UpstreamError, delay: Duration| {
                warn!(url, error = %e, delay_ms = delay.as_millis() as u64, "Retrying upstream request");
            })
            .await
    }

    /// Every release of one repository, across all pages.
    async fn list_repository(&self, repository: &str) -> Result<Vec<GithubRelease>> {
        let page_size = self.config.page_size.max(1);
        let mut releases = Vec::new();

        for page in 1.. {
            let url = format!(
                "{}/repos/{repository}/releases?per_page={page_size}&page={page}",
                self.api_url()
            );
            let Some(batch) = self.get_with_retry::<Vec<GithubRelease>>(&url).await? else {
                debug!(repository, "Repository not found, treating as empty");
                break;
            };
            let short_page = batch.len() < page_size as usize;
            releases.extend(batch);
            if short_page {
                break;
            }
        }

        Ok(releases)
    }
}

#[async_trait]
impl UpstreamClient for GithubUpstreamClient {
    async fn get_summary(&self, feature_version: u32) -> Result<Vec<ReleaseSummary>> {
        let repositories = self.config.repositories_for(feature_version);
        if repositories.is_empty() {
            return Err(UpstreamError::UnknownVersion(feature_version));
        }

        let mut summary = Vec::new();
        for repository in &repositories {
            let releases = self.list_repository(repository).await?;
            summary.extend(releases.iter().filter(|r| !r.draft).map(|r| ReleaseSummary {
                id: release_id(repository, r.id),
                updated_at: r.updated_at(),
            }));
        }

        debug!(feature_version, releases = summary.len(), "Listed upstream releases");
        Ok(summary)
    }

    async fn get_release_by_id(&self, id: &ReleaseId) -> Result<FetchOutcome> {
        let (repository, numeric) = split_release_id(id)?;
        let url = format!("{}/repos/{repository}/releases/{numeric}", self.api_url());

        Ok(match self.get_with_retry::<GithubRelease>(&url).await? {
            Some(release) => FetchOutcome::Found(release.into_raw(repository)),
            None => FetchOutcome::NotFound,
        })
    }
}
