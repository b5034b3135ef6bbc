//! Product listing and per-product detail commands.
//!
//! `pwatch products` lists every product present in the store with its
//! catalog classification. `pwatch show <product>` prints a per-release
//! breakdown for one product, newest patches last.

use anyhow::{bail, Result};
use sqlx::Row;

use crate::aggregate::aggregate_product;
use crate::config::Config;
use crate::db;
use crate::innovation::trends_from_counts;
use crate::models::{AlertLevel, Category};
use crate::normalize::{date_sort_key, VersionKey};
use crate::sqlite_store::SqliteStore;
use crate::store::Store;

/// CLI entry point for `pwatch products`.
pub async fn run_products(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = sqlx::query(
        r#"
        SELECT r.product, COUNT(*) AS patch_count, p.category, p.kind
        FROM releases r
        LEFT JOIN products p ON p.product = r.product
        GROUP BY r.product
        ORDER BY r.product
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        println!("No products in store. Run `pwatch run <dir>` first.");
        pool.close().await;
        return Ok(());
    }

    println!(
        "{:<16} {:>7}   {:<16} {}",
        "PRODUCT", "PATCHES", "CATEGORY", "KIND"
    );
    println!("{}", "-".repeat(52));
    for row in &rows {
        let category: Option<String> = row.get("category");
        let kind: Option<String> = row.get("kind");
        println!(
            "{:<16} {:>7}   {:<16} {}",
            row.get::<String, _>("product"),
            row.get::<i64, _>("patch_count"),
            category.as_deref().unwrap_or("-"),
            kind.as_deref().unwrap_or("-")
        );
    }

    pool.close().await;
    Ok(())
}

/// CLI entry point for `pwatch show <product>`.
pub async fn run_show(config: &Config, product: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let mut records = store.records_for(product).await?;
    if records.is_empty() {
        store.close().await;
        bail!("product not found in store: {}", product);
    }
    records.sort_by(|a, b| {
        date_sort_key(a.release_date())
            .cmp(&date_sort_key(b.release_date()))
            .then_with(|| {
                VersionKey::parse(&a.patch_version).cmp(&VersionKey::parse(&b.patch_version))
            })
    });

    let stats = aggregate_product(&records);

    println!("--- {} ---", product);
    println!("patches:      {}", stats.totals.patches);
    println!("majors:       {}", stats.majors.len());
    println!("alerts:       {}", stats.totals.total_alerts());
    println!("innovations:  {}", stats.totals.total_innovations());
    println!();

    println!(
        "{:<12} {:<16} {:<14} {:>7} {:>6} {:>6}",
        "PATCH", "DATE", "DOMINANT", "CHANGES", "CRIT", "INNOV"
    );
    println!("{}", "-".repeat(66));
    for record in &records {
        let critical = record.alerts.critical_count;
        println!(
            "{:<12} {:<16} {:<14} {:>7} {:>6} {:>6}",
            record.patch_version,
            record.date,
            record.ai_analysis.dominant_type.as_str(),
            record.changes.len(),
            critical,
            record.innovation_summary.total_innovations
        );
    }

    println!();
    println!("By change category:");
    for category in Category::ALL {
        let count = stats.totals.categories.get(&category).copied().unwrap_or(0);
        if count > 0 {
            println!("  {:<16} {:>6}", category.as_str(), count);
        }
    }

    let trends = trends_from_counts(&stats.totals.themes);
    if !trends.established_trends.is_empty() || !trends.emerging_trends.is_empty() {
        println!();
        println!("Innovation trends:");
        for entry in &trends.established_trends {
            println!(
                "  {:<22} {:>6.1}%  established",
                entry.category.as_str(),
                entry.percentage
            );
        }
        for entry in &trends.emerging_trends {
            println!(
                "  {:<22} {:>6.1}%  emerging",
                entry.category.as_str(),
                entry.percentage
            );
        }
    }

    let critical = stats
        .totals
        .alert_levels
        .get(&AlertLevel::Critical)
        .copied()
        .unwrap_or(0);
    if critical > 0 {
        println!();
        println!("Critical alerts:");
        for record in &records {
            for alert in &record.alerts.alerts {
                if alert.level == AlertLevel::Critical {
                    println!("  [{}] {}", record.patch_version, alert.description);
                }
            }
        }
    }

    store.close().await;
    Ok(())
}
