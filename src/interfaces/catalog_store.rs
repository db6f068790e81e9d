//! CatalogStore trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::committer::ChecksumToken;
use crate::model::Catalog;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown storage type: {0}")]
    UnknownType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable home of the single `(catalog, token, timestamp)` record.
///
/// Writers are serialized by the committer's lock, so implementations only
/// need read-after-write consistency for a single writer.
///
/// # Implementations
///
/// - `SqliteCatalogStore`: SQLite storage
/// - `MemoryCatalogStore`: In-memory storage for tests and ephemeral runs
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Checksum token recorded with the stored catalog, `None` when empty.
    async fn current_token(&self) -> Result<Option<ChecksumToken>>;

    /// Replace the stored record.
    async fn write(&self, catalog: &Catalog, token: &ChecksumToken) -> Result<()>;

    /// Load the stored catalog, `None` when empty.
    async fn read_catalog(&self) -> Result<Option<Catalog>>;

    /// When the record was last written.
    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>>;
}
