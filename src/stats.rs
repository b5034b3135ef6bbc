//! Store statistics and health overview.
//!
//! Rolls every stored record up through the aggregation hierarchy and
//! prints a summary. Used by `pwatch stats` to give confidence that
//! harvests and syncs are landing as expected. Totals are recomputed from
//! the stored records on every invocation.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::aggregate::{aggregate_global, aggregate_product, ProductStats};
use crate::config::Config;
use crate::db;
use crate::innovation::trends_from_counts;
use crate::models::{AlertLevel, Category, EnrichedRecord, Theme};
use crate::sqlite_store::SqliteStore;
use crate::store::Store;

/// Run the stats command: aggregate the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let records = store.all_records().await?;
    let by_product = group_by_product(records);
    let per_product: BTreeMap<String, ProductStats> = by_product
        .iter()
        .map(|(product, records)| (product.clone(), aggregate_product(records)))
        .collect();
    let global = aggregate_global(per_product);

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Patchwatch — Store Stats");
    println!("========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Products:     {}", global.products.len());
    println!("  Patches:      {}", global.totals.patches);
    println!("  Alerts:       {}", global.totals.total_alerts());
    println!("  Innovations:  {}", global.totals.total_innovations());

    if !global.products.is_empty() {
        println!();
        println!("  By product:");
        println!(
            "  {:<16} {:>7} {:>8} {:>7} {:>7} {:>12}",
            "PRODUCT", "PATCHES", "CRITICAL", "HIGH", "ALERTS", "INNOVATIONS"
        );
        println!("  {}", "-".repeat(64));
        for (product, stats) in &global.products {
            let critical = stats
                .totals
                .alert_levels
                .get(&AlertLevel::Critical)
                .copied()
                .unwrap_or(0);
            let high = stats
                .totals
                .alert_levels
                .get(&AlertLevel::High)
                .copied()
                .unwrap_or(0);
            println!(
                "  {:<16} {:>7} {:>8} {:>7} {:>7} {:>12}",
                product,
                stats.totals.patches,
                critical,
                high,
                stats.totals.total_alerts(),
                stats.totals.total_innovations()
            );
        }

        println!();
        println!("  By change category:");
        for category in Category::ALL {
            let count = global
                .totals
                .categories
                .get(&category)
                .copied()
                .unwrap_or(0);
            if count > 0 {
                println!("  {:<16} {:>7}", category.as_str(), count);
            }
        }

        let themes: Vec<(Theme, u64)> = global
            .totals
            .themes
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(theme, count)| (*theme, *count))
            .collect();
        if !themes.is_empty() {
            println!();
            println!("  By innovation theme:");
            for (theme, count) in themes {
                println!("  {:<22} {:>7}", theme.as_str(), count);
            }
        }

        let trends = trends_from_counts(&global.totals.themes);
        if !trends.established_trends.is_empty() || !trends.emerging_trends.is_empty() {
            println!();
            println!("  Innovation trends:");
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
    }

    println!();

    store.close().await;
    Ok(())
}

fn group_by_product(records: Vec<EnrichedRecord>) -> BTreeMap<String, Vec<EnrichedRecord>> {
    let mut by_product: BTreeMap<String, Vec<EnrichedRecord>> = BTreeMap::new();
    for record in records {
        by_product.entry(record.database.clone()).or_default().push(record);
    }
    by_product
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
