//! Deterministic catalog checksums.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::Catalog;

/// Digest of a catalog snapshot, used as the optimistic concurrency stamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumToken(String);

impl ChecksumToken {
    /// Wrap an already computed digest (e.g. one read back from storage).
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChecksumToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 of the catalog's canonical JSON form.
///
/// Every map in the model is a `BTreeMap` and struct fields serialize in
/// declaration order, so value-equal catalogs produce identical bytes.
pub fn checksum(catalog: &Catalog) -> Result<ChecksumToken, serde_json::Error> {
    let canonical = serde_json::to_vec(catalog)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(ChecksumToken(hex::encode(hasher.finalize())))
}
