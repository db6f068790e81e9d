//! Version identifier parsing.
//!
//! Upstream release tags and binary filenames carry versions in several
//! historical formats (`8u212-b03`, `jdk-11.0.5+10`, `11.0.5+10.1`, nightly
//! date tags). `parse` runs an ordered cascade of grammars over the input and
//! returns the first match that passes the sanity check.

mod grammar;

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest feature version a parsed major may carry.
pub const MIN_MAJOR: u32 = 7;
/// Highest feature version a parsed major may carry.
pub const MAX_MAJOR: u32 = 101;

static TIMESTAMP_OPTIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2}$").expect("valid timestamp regex")
});

/// Raised when no grammar accepts a version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unable to parse version: {input}")]
pub struct ParseError {
    pub input: String,
}

/// Fields captured by a grammar before sanity checking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFields {
    pub major: u32,
    pub minor: u32,
    pub security: u32,
    pub patch: Option<u32>,
    pub pre: Option<String>,
    pub build: u32,
    pub adopt_build_number: Option<u32>,
    pub optional: Option<String>,
}

impl VersionFields {
    /// Rejects matches that are structurally valid but cannot be a real build.
    ///
    /// A stray number such as `150` matches the degenerate dotted grammar, so
    /// the major must fall in `[MIN_MAJOR, MAX_MAJOR]`. A version must also
    /// carry a security or build number, or a timestamp-like optional.
    fn is_sane(&self) -> bool {
        if !(MIN_MAJOR..=MAX_MAJOR).contains(&self.major) {
            return false;
        }
        self.security != 0
            || self.build != 0
            || self
                .optional
                .as_deref()
                .is_some_and(|opt| TIMESTAMP_OPTIONAL.is_match(opt))
    }
}

/// A parsed build version.
///
/// `semver` is always derived from the numeric, pre-release and optional
/// fields; it is serialized for consumers but recomputed on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredVersionData")]
pub struct VersionData {
    major: u32,
    minor: u32,
    security: u32,
    patch: Option<u32>,
    pre: Option<String>,
    build: u32,
    adopt_build_number: Option<u32>,
    optional: Option<String>,
    openjdk_version: String,
    semver: String,
}

/// Serialized form without the derived `semver`.
#[derive(Deserialize)]
struct StoredVersionData {
    major: u32,
    minor: u32,
    security: u32,
    patch: Option<u32>,
    pre: Option<String>,
    build: u32,
    adopt_build_number: Option<u32>,
    optional: Option<String>,
    openjdk_version: String,
}

impl From<StoredVersionData> for VersionData {
    fn from(stored: StoredVersionData) -> Self {
        VersionData::new(
            VersionFields {
                major: stored.major,
                minor: stored.minor,
                security: stored.security,
                patch: stored.patch,
                pre: stored.pre,
                build: stored.build,
                adopt_build_number: stored.adopt_build_number,
                optional: stored.optional,
            },
            stored.openjdk_version,
        )
    }
}

impl VersionData {
    /// Build a version from captured fields and the string they came from.
    pub fn new(fields: VersionFields, openjdk_version: impl Into<String>) -> Self {
        let semver = render_semver(&fields);
        Self {
            major: fields.major,
            minor: fields.minor,
            security: fields.security,
            patch: fields.patch,
            pre: fields.pre,
            build: fields.build,
            adopt_build_number: fields.adopt_build_number,
            optional: fields.optional,
            openjdk_version: openjdk_version.into(),
            semver,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn security(&self) -> u32 {
        self.security
    }

    pub fn patch(&self) -> Option<u32> {
        self.patch
    }

    pub fn pre(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    pub fn build(&self) -> u32 {
        self.build
    }

    pub fn adopt_build_number(&self) -> Option<u32> {
        self.adopt_build_number
    }

    pub fn optional(&self) -> Option<&str> {
        self.optional.as_deref()
    }

    /// The string this version was parsed from.
    pub fn openjdk_version(&self) -> &str {
        &self.openjdk_version
    }

    pub fn semver(&self) -> &str {
        &self.semver
    }

    /// Structural fields, for re-deriving `semver` or rebuilding the value.
    pub fn fields(&self) -> VersionFields {
        VersionFields {
            major: self.major,
            minor: self.minor,
            security: self.security,
            patch: self.patch,
            pre: self.pre.clone(),
            build: self.build,
            adopt_build_number: self.adopt_build_number,
            optional: self.optional.clone(),
        }
    }

    /// True for early-access builds.
    pub fn is_pre_release(&self) -> bool {
        self.pre.is_some()
    }
}

/// Render the semver string for a set of fields.
///
/// Build metadata lists the present, non-zero components
/// `patch * 100 + build`, `adopt_build_number` and `optional`, joined by `.`.
pub fn render_semver(fields: &VersionFields) -> String {
    let mut semver = format!("{}.{}.{}", fields.major, fields.minor, fields.security);
    if let Some(pre) = &fields.pre {
        semver.push('-');
        semver.push_str(pre);
    }

    let mut metadata = Vec::with_capacity(3);
    let build = fields
        .patch
        .unwrap_or(0)
        .saturating_mul(100)
        .saturating_add(fields.build);
    if build != 0 {
        metadata.push(build.to_string());
    }
    if let Some(adopt) = fields.adopt_build_number.filter(|n| *n != 0) {
        metadata.push(adopt.to_string());
    }
    if let Some(optional) = &fields.optional {
        metadata.push(optional.clone());
    }

    if !metadata.is_empty() {
        semver.push('+');
        semver.push_str(&metadata.join("."));
    }
    semver
}

/// A pre-release sorts before the final release it leads up to.
fn compare_pre(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

impl Ord for VersionData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.security.cmp(&other.security))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| compare_pre(&self.pre, &other.pre))
            .then(self.build.cmp(&other.build))
            .then(self.adopt_build_number.cmp(&other.adopt_build_number))
            .then_with(|| self.optional.cmp(&other.optional))
            // Keeps Ord consistent with Eq for versions spelled differently.
            .then_with(|| self.openjdk_version.cmp(&other.openjdk_version))
    }
}

impl PartialOrd for VersionData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for VersionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.semver)
    }
}

/// Parse a version identifier.
///
/// With `exact_match` the whole input (optionally prefixed by `jdk`/`openjdk`)
/// must be a version; otherwise a version is extracted from anywhere in the
/// input, so tags and filenames with surrounding noise are accepted.
///
/// Grammars are tried in order. A match rejected by the sanity check falls
/// through to the next grammar.
pub fn parse(raw: &str, exact_match: bool) -> Result<VersionData, ParseError> {
    let input = raw.trim();

    grammar::GRAMMARS
        .iter()
        .filter_map(|grammar| grammar.attempt(input, exact_match))
        .find(VersionFields::is_sane)
        .map(|fields| VersionData::new(fields, input))
        .ok_or_else(|| ParseError {
            input: raw.to_string(),
        })
}

#[cfg(test)]
mod tests;
