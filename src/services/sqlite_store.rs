//! src/services/sqlite_store.rs
//!
//! SqliteStore: metadata records kept as JSON documents in a single
//! `metadata` table keyed by `(set_name, entity_id)`.

use crate::{
    models::record::MetadataRecord,
    services::store::{
        MetadataStore, StoreError, StoreResult, ensure_entity_id_present, ensure_set_name_safe,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, warn};

/// Schema applied by `--migrate`.
const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone)]
pub struct SqliteStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl SqliteStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Run the embedded schema statements one by one.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        let statements = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        tracing::info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }
}

/// Parse a stored document, filling in the entity id from its key.
fn parse_row(entity_id: &str, data: &str) -> StoreResult<MetadataRecord> {
    let mut record = serde_json::from_str::<MetadataRecord>(data).map_err(|source| {
        StoreError::Unreadable {
            entity_id: entity_id.to_string(),
            source,
        }
    })?;
    if record.entityid.is_none() {
        record.entityid = Some(entity_id.to_string());
    }
    Ok(record)
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn get(&self, entity_id: &str, set: &str) -> StoreResult<Option<MetadataRecord>> {
        ensure_set_name_safe(set)?;
        let data = sqlx::query_scalar::<_, String>(
            "SELECT entity_data FROM metadata WHERE set_name = ? AND entity_id = ?",
        )
        .bind(set)
        .bind(entity_id)
        .fetch_optional(&*self.db)
        .await?;

        data.map(|data| parse_row(entity_id, &data)).transpose()
    }

    async fn list(&self, set: &str) -> StoreResult<Vec<MetadataRecord>> {
        ensure_set_name_safe(set)?;
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT entity_id, entity_data FROM metadata
             WHERE set_name = ? ORDER BY entity_id ASC",
        )
        .bind(set)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|(entity_id, data)| match parse_row(entity_id, data) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("ignoring unreadable metadata row: {}", err);
                    None
                }
            })
            .collect())
    }

    async fn save(&self, entity_id: &str, set: &str, record: &MetadataRecord) -> StoreResult<()> {
        ensure_set_name_safe(set)?;
        ensure_entity_id_present(entity_id)?;
        let data = serde_json::to_string(record)?;

        sqlx::query(
            r#"
            INSERT INTO metadata (set_name, entity_id, entity_data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(set_name, entity_id) DO UPDATE SET
                entity_data = excluded.entity_data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(set)
        .bind(entity_id)
        .bind(&data)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        debug!("stored metadata `{}` in `{}`", entity_id, set);
        Ok(())
    }

    async fn delete(&self, entity_id: &str, set: &str) -> StoreResult<()> {
        ensure_set_name_safe(set)?;
        ensure_entity_id_present(entity_id)?;

        let result = sqlx::query("DELETE FROM metadata WHERE set_name = ? AND entity_id = ?")
            .bind(set)
            .bind(entity_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            warn!("attempted to delete missing metadata `{}` in `{}`", entity_id, set);
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}
