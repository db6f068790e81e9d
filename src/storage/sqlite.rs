//! SQLite implementation of the catalog store.
//!
//! The catalog is persisted as one JSON document in a single-row table,
//! together with its checksum token and write time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::committer::ChecksumToken;
use crate::interfaces::catalog_store::{CatalogStore, Result, StorageError};
use crate::model::Catalog;

use super::schema::{CatalogSnapshots, CATALOG_ROW_ID, CREATE_CATALOG_SNAPSHOTS_TABLE};

/// SQLite implementation of CatalogStore.
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Create a new SQLite catalog store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and initialize it.
    pub async fn connect(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite:{}?mode=rwc", path))
            .await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_CATALOG_SNAPSHOTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn select_column(&self, column: CatalogSnapshots) -> Result<Option<String>> {
        let query = Query::select()
            .column(column)
            .from(CatalogSnapshots::Table)
            .and_where(Expr::col(CatalogSnapshots::Id).eq(CATALOG_ROW_ID))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(Some(row.try_get(0)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn current_token(&self) -> Result<Option<ChecksumToken>> {
        Ok(self
            .select_column(CatalogSnapshots::Checksum)
            .await?
            .map(ChecksumToken::new))
    }

    async fn write(&self, catalog: &Catalog, token: &ChecksumToken) -> Result<()> {
        let catalog_json = serde_json::to_string(catalog)?;
        let updated_at = Utc::now().to_rfc3339();

        let query = Query::insert()
            .into_table(CatalogSnapshots::Table)
            .columns([
                CatalogSnapshots::Id,
                CatalogSnapshots::CatalogJson,
                CatalogSnapshots::Checksum,
                CatalogSnapshots::UpdatedAt,
            ])
            .values_panic([
                CATALOG_ROW_ID.into(),
                catalog_json.into(),
                token.as_str().into(),
                updated_at.into(),
            ])
            .on_conflict(
                OnConflict::column(CatalogSnapshots::Id)
                    .update_columns([
                        CatalogSnapshots::CatalogJson,
                        CatalogSnapshots::Checksum,
                        CatalogSnapshots::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;

        Ok(())
    }

    async fn read_catalog(&self) -> Result<Option<Catalog>> {
        match self.select_column(CatalogSnapshots::CatalogJson).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        match self.select_column(CatalogSnapshots::UpdatedAt).await? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| StorageError::InvalidTimestamp(format!("{raw}: {e}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::committer::checksum;
    use crate::test_utils::{catalog_of, release};

    async fn memory_store() -> SqliteCatalogStore {
        // One connection: every in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteCatalogStore::new(pool);
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_sqlite_store_empty() {
        let store = memory_store().await;
        assert!(store.current_token().await.unwrap().is_none());
        assert!(store.read_catalog().await.unwrap().is_none());
        assert!(store.last_updated().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_round_trips_catalog() {
        let store = memory_store().await;
        let catalog = catalog_of(11, vec![release("r1", "jdk-11.0.5+10")]);
        let token = checksum(&catalog).unwrap();

        store.write(&catalog, &token).await.unwrap();

        assert_eq!(store.current_token().await.unwrap(), Some(token.clone()));
        let loaded = store.read_catalog().await.unwrap().unwrap();
        assert_eq!(loaded, catalog);
        assert_eq!(checksum(&loaded).unwrap(), token);
        assert!(store.last_updated().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sqlite_store_overwrites_single_row() {
        let store = memory_store().await;
        let first = catalog_of(11, vec![release("r1", "jdk-11.0.5+10")]);
        let second = catalog_of(17, vec![release("r2", "jdk-17.0.1+12")]);

        store.write(&first, &checksum(&first).unwrap()).await.unwrap();
        store
            .write(&second, &checksum(&second).unwrap())
            .await
            .unwrap();

        assert_eq!(store.read_catalog().await.unwrap(), Some(second.clone()));
        assert_eq!(
            store.current_token().await.unwrap(),
            Some(checksum(&second).unwrap())
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_snapshots")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_connect_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        let store = SqliteCatalogStore::connect(path.to_str().unwrap())
            .await
            .unwrap();

        let catalog = Catalog::empty();
        store
            .write(&catalog, &checksum(&catalog).unwrap())
            .await
            .unwrap();
        assert!(path.exists());
    }
}
