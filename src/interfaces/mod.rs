//! Abstract interfaces for the synchronization engine's collaborators.
//!
//! These traits define the contracts for:
//! - Upstream release listings (summary + per-id fetch)
//! - Mapping raw upstream releases into catalog releases
//! - Durable catalog storage (snapshot + checksum token)

pub mod catalog_store;
pub mod mapper;
pub mod upstream;

pub use catalog_store::{CatalogStore, StorageError};
pub use mapper::{MapError, ReleaseMapper};
pub use upstream::{FetchOutcome, RawAsset, RawRelease, ReleaseSummary, UpstreamClient, UpstreamError};
