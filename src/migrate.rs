use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Enriched release records. The UNIQUE constraint on
    // (product, patch_version) is the authoritative duplicate guard for
    // the synchronizer; in-process key checks are only an optimization.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS releases (
            id TEXT PRIMARY KEY,
            product TEXT NOT NULL,
            major_version TEXT NOT NULL,
            patch_version TEXT NOT NULL,
            release_date TEXT,
            record_json TEXT NOT NULL,
            synced_at INTEGER NOT NULL,
            UNIQUE(product, patch_version)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Per-product classification metadata (storage model + family).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            product TEXT PRIMARY KEY,
            category TEXT NOT NULL,
            kind TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_releases_product ON releases(product)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_releases_release_date ON releases(release_date DESC)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
