//! Default mapping from upstream releases to catalog releases.

use crate::interfaces::{MapError, RawRelease, ReleaseMapper};
use crate::model::{Binary, Release, ReleaseKind};
use crate::version::{self, VersionData};

/// Maps releases by parsing their tag, attaching the configured vendor.
///
/// Assets are carried over as published; classifying them by platform is
/// left to consumers.
pub struct DefaultReleaseMapper {
    vendor: String,
}

impl DefaultReleaseMapper {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
        }
    }

    /// Tags are tried as exact versions first, then searched for one.
    fn version_of(raw: &RawRelease) -> Result<VersionData, MapError> {
        version::parse(&raw.tag_name, true)
            .or_else(|_| version::parse(&raw.tag_name, false))
            .map_err(|source| MapError::Version {
                id: raw.id.clone(),
                source,
            })
    }
}

impl ReleaseMapper for DefaultReleaseMapper {
    fn to_release(&self, raw: &RawRelease) -> Result<Release, MapError> {
        if raw.draft {
            return Err(MapError::Draft(raw.id.clone()));
        }

        let version_data = Self::version_of(raw)?;
        let release_kind = if raw.prerelease || version_data.pre() == Some("ea") {
            ReleaseKind::Ea
        } else {
            ReleaseKind::Ga
        };

        let binaries = raw
            .assets
            .iter()
            .map(|asset| Binary {
                name: asset.name.clone(),
                link: asset.download_url.clone(),
                size: asset.size,
                content_type: asset.content_type.clone(),
                updated_at: asset.updated_at,
            })
            .collect();

        Ok(Release {
            id: raw.id.clone(),
            release_kind,
            name: raw.name.clone(),
            link: raw.url.clone(),
            published_at: raw.published_at,
            updated_at: raw.updated_at,
            vendor: self.vendor.clone(),
            version_data,
            binaries,
        })
    }
}
