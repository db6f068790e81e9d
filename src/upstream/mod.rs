//! Upstream release host implementations.

pub mod github;

pub use github::GithubUpstreamClient;
