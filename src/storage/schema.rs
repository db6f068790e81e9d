//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Key of the single catalog row.
pub const CATALOG_ROW_ID: i64 = 1;

/// Catalog snapshot table schema.
#[derive(Iden)]
pub enum CatalogSnapshots {
    #[iden = "catalog_snapshots"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "catalog_json"]
    CatalogJson,
    #[iden = "checksum"]
    Checksum,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// SQL for creating the catalog snapshot table.
pub const CREATE_CATALOG_SNAPSHOTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS catalog_snapshots (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    catalog_json TEXT NOT NULL,
    checksum TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
