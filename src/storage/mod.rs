//! Storage implementations.

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::{CatalogStore, StorageError};

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryCatalogStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCatalogStore;

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn CatalogStore>, StorageError> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory (catalog is lost on restart)");
            Ok(Arc::new(MemoryCatalogStore::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!("Storage: sqlite at {}", config.sqlite.path);
            Ok(Arc::new(SqliteCatalogStore::connect(&config.sqlite.path).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => Err(StorageError::UnknownType(
            "sqlite (feature not enabled)".to_string(),
        )),
    }
}
