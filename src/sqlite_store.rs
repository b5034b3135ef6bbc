//! SQLite-backed [`Store`] implementation.
//!
//! Records are persisted as their full JSON wire shape in `record_json`,
//! with the key columns lifted out for indexing. The table-level
//! `UNIQUE(product, patch_version)` constraint is the authoritative
//! duplicate guard: `INSERT OR IGNORE` turns a uniqueness violation into
//! "already synced" instead of an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::catalog::ProductClass;
use crate::models::{EnrichedRecord, UNKNOWN_DATE_MARKER};
use crate::store::{DuplicateKey, Store};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn existing_keys(&self) -> Result<HashSet<(String, String)>> {
        let rows = sqlx::query("SELECT product, patch_version FROM releases")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("product"), row.get("patch_version")))
            .collect())
    }

    async fn insert_new(&self, record: &EnrichedRecord) -> Result<bool> {
        let record_json =
            serde_json::to_string(record).context("Failed to serialize record")?;
        // Unknown dates are stored as NULL so date ordering in SQL puts
        // them last, consistent with the in-process ordering rule.
        let release_date = if record.date == UNKNOWN_DATE_MARKER {
            None
        } else {
            Some(record.date.clone())
        };
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO releases
                (id, product, major_version, patch_version, release_date, record_json, synced_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.database)
        .bind(&record.major_version)
        .bind(&record.patch_version)
        .bind(&release_date)
        .bind(&record_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_duplicates(&self) -> Result<Vec<DuplicateKey>> {
        let rows = sqlx::query(
            r#"
            SELECT product, patch_version, COUNT(*) AS n
            FROM releases
            GROUP BY product, patch_version
            HAVING COUNT(*) > 1
            ORDER BY n DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DuplicateKey {
                product: row.get("product"),
                patch_version: row.get("patch_version"),
                count: row.get("n"),
            })
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT product FROM releases ORDER BY product",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn records_for(&self, product: &str) -> Result<Vec<EnrichedRecord>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT record_json FROM releases WHERE product = ? ORDER BY patch_version",
        )
        .bind(product)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|json| {
                serde_json::from_str(json).context("Failed to deserialize stored record")
            })
            .collect()
    }

    async fn all_records(&self) -> Result<Vec<EnrichedRecord>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT record_json FROM releases ORDER BY product, patch_version",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|json| {
                serde_json::from_str(json).context("Failed to deserialize stored record")
            })
            .collect()
    }

    async fn upsert_product_class(&self, product: &str, class: ProductClass) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (product, category, kind) VALUES (?, ?, ?)
            ON CONFLICT(product) DO UPDATE SET
                category = excluded.category,
                kind = excluded.kind
            "#,
        )
        .bind(product)
        .bind(class.category.as_str())
        .bind(class.kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
