//! ReleaseMapper trait definition.

use thiserror::Error;

use super::upstream::RawRelease;
use crate::model::{Release, ReleaseId};
use crate::version::ParseError;

/// Permanent, per-release mapping failure.
///
/// The reconciler never retries a release that failed mapping until the next
/// full rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Release {id}: {source}")]
    Version {
        id: ReleaseId,
        #[source]
        source: ParseError,
    },

    #[error("Release {0} is an unpublished draft")]
    Draft(ReleaseId),
}

/// Converts upstream release objects into catalog releases.
pub trait ReleaseMapper: Send + Sync {
    fn to_release(&self, raw: &RawRelease) -> Result<Release, MapError>;
}
