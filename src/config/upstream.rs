//! Upstream client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Placeholder replaced by the feature version in repository templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Upstream release host settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the REST API.
    pub api_url: String,
    /// `owner/repo` templates; `{version}` is replaced by the feature version.
    /// Every template contributes releases to the same feature version.
    pub repositories: Vec<String>,
    /// Releases requested per listing page.
    pub page_size: u32,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Backoff for transient failures.
    pub retry: RetryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            repositories: vec!["adoptium/temurin{version}-binaries".to_string()],
            page_size: 100,
            user_agent: concat!("catalog-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Repositories holding releases of one feature version.
    pub fn repositories_for(&self, feature_version: u32) -> Vec<String> {
        self.repositories
            .iter()
            .map(|template| template.replace(VERSION_PLACEHOLDER, &feature_version.to_string()))
            .collect()
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub min_delay_ms: u64,
    /// Cap on any single delay.
    pub max_delay_ms: u64,
    /// Retries after the initial attempt.
    pub max_times: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 30_000,
            max_times: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repositories_for_expands_template() {
        let config = UpstreamConfig {
            repositories: vec![
                "adoptium/temurin{version}-binaries".to_string(),
                "adoptopenjdk/openjdk{version}-binaries".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(
            config.repositories_for(17),
            vec![
                "adoptium/temurin17-binaries".to_string(),
                "adoptopenjdk/openjdk17-binaries".to_string(),
            ]
        );
    }
}
