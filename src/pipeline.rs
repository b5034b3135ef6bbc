//! End-to-end ingestion pipeline.
//!
//! Reads harvester JSON files from a source directory, normalizes the raw
//! records, enriches each release with classification, alert, and
//! innovation summaries, upserts product catalog metadata, and hands the
//! batch to the incremental synchronizer. Real runs finish with an
//! integrity scan over the whole store. A malformed file or record is
//! logged and dropped; it never aborts the run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::alerts::AlertDeriver;
use crate::catalog::ProductCatalog;
use crate::classify::Classifier;
use crate::config::{load_taxonomy_overrides, Config};
use crate::innovation::InnovationTagger;
use crate::models::{format_release_date, EnrichedRecord, RawRecord, ReleaseRecord};
use crate::normalize::{date_sort_key, normalize_batch, VersionKey};
use crate::store::Store;
use crate::sync::{check_integrity, sync_records, SyncReport};
use crate::taxonomy::Taxonomy;

/// What one `run` invocation did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Source files successfully parsed.
    pub files: u64,
    /// Source files skipped because they could not be parsed.
    pub bad_files: u64,
    /// Raw records dropped during normalization.
    pub dropped: u64,
    /// Records enriched and offered to the synchronizer.
    pub processed: u64,
    pub report: SyncReport,
    /// Duplicate keys found by the post-sync integrity scan.
    pub conflicts: u64,
}

/// Enrich one normalized release with every derived summary.
pub fn enrich_record(
    record: &ReleaseRecord,
    classifier: &Classifier<'_>,
    deriver: &AlertDeriver<'_>,
    tagger: &InnovationTagger<'_>,
) -> EnrichedRecord {
    let ai_analysis = classifier.analyze_patch(record);
    let alerts = deriver.summarize(&record.changes);
    let innovation_summary = tagger.summarize(&ai_analysis.details);
    EnrichedRecord {
        database: record.product.clone(),
        major_version: record.major_version.clone(),
        patch_version: record.patch_version.clone(),
        date: format_release_date(record.release_date),
        changes: record.changes.clone(),
        ai_analysis,
        alerts,
        innovation_summary,
    }
}

/// Parse one harvester file. Files hold either an array of records or a
/// single record object.
fn parse_source_file(content: &str) -> Result<Vec<RawRecord>> {
    let value: serde_json::Value =
        serde_json::from_str(content).context("Invalid JSON")?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).context("Unexpected array element shape")
        }
        serde_json::Value::Object(_) => {
            let record: RawRecord =
                serde_json::from_value(value).context("Unexpected record shape")?;
            Ok(vec![record])
        }
        _ => anyhow::bail!("Top-level JSON must be an object or an array"),
    }
}

/// Collect raw records from every `*.json` file in `dir`, in file name
/// order. Unparseable files are counted and skipped. Returns the records
/// plus `(parsed_files, bad_files)` counts.
pub fn load_source_dir(dir: &Path) -> Result<(Vec<RawRecord>, u64, u64)> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut records = Vec::new();
    let mut parsed_files = 0u64;
    let mut bad_files = 0u64;
    for path in &paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file: {}", path.display()))?;
        match parse_source_file(&content) {
            Ok(mut parsed) => {
                info!(file = %path.display(), records = parsed.len(), "Loaded source file");
                records.append(&mut parsed);
                parsed_files += 1;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "Skipping unparseable source file");
                bad_files += 1;
            }
        }
    }
    Ok((records, parsed_files, bad_files))
}

/// Run the full pipeline over one source directory.
///
/// With `dry_run`, everything up to and including the sync plan is
/// computed, but nothing is written. `limit` caps the number of
/// normalized records processed, for sampling large harvests.
pub async fn run_pipeline(
    dir: &Path,
    store: &dyn Store,
    config: &Config,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<RunOutcome> {
    let overrides = load_taxonomy_overrides(config)?;
    let taxonomy = Taxonomy::with_overrides(&overrides)?;
    let classifier = Classifier::new(&taxonomy);
    let deriver = AlertDeriver::new(&taxonomy);
    let tagger = InnovationTagger::new(&taxonomy);
    let catalog = ProductCatalog::with_overrides(&config.products);

    let (raws, parsed_files, bad_files) = load_source_dir(dir)?;
    let (mut releases, dropped) = normalize_batch(&raws);
    // Deterministic order: by product, then release date with unknown
    // dates last, then numeric version order.
    releases.sort_by(|a, b| {
        a.product
            .cmp(&b.product)
            .then_with(|| date_sort_key(a.release_date).cmp(&date_sort_key(b.release_date)))
            .then_with(|| {
                VersionKey::parse(&a.patch_version).cmp(&VersionKey::parse(&b.patch_version))
            })
    });
    if let Some(limit) = limit {
        releases.truncate(limit);
    }

    let enriched: Vec<EnrichedRecord> = releases
        .iter()
        .map(|release| enrich_record(release, &classifier, &deriver, &tagger))
        .collect();

    let (report, conflicts) = if dry_run {
        (plan_only(&enriched, store).await?, 0)
    } else {
        for release in &releases {
            if let Some(class) = catalog.classify(&release.product) {
                store.upsert_product_class(&release.product, class).await?;
            }
        }
        let report = sync_records(&enriched, store, &config.sync).await?;
        // Post-sync integrity scan over the whole store, not just this batch.
        let conflicts = check_integrity(store).await?;
        for conflict in &conflicts {
            warn!(error = %conflict, "Store integrity conflict");
        }
        (report, conflicts.len() as u64)
    };

    info!(
        files = parsed_files,
        bad_files,
        dropped,
        processed = enriched.len(),
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        conflicts,
        dry_run,
        "Pipeline run complete"
    );

    Ok(RunOutcome {
        files: parsed_files,
        bad_files,
        dropped,
        processed: enriched.len() as u64,
        report,
        conflicts,
    })
}

/// Dry-run sync plan: counts what a real run would insert or skip.
async fn plan_only(records: &[EnrichedRecord], store: &dyn Store) -> Result<SyncReport> {
    let mut seen = store
        .existing_keys()
        .await
        .context("Failed to read existing keys from store")?;
    let mut report = SyncReport::default();
    for record in records {
        if seen.insert(record.key()) {
            report.inserted += 1;
        } else {
            report.skipped += 1;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, SyncConfig, TaxonomyConfig};
    use crate::store::MemoryStore;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn test_config() -> Config {
        Config {
            db: DbConfig {
                path: "unused.db".into(),
            },
            sync: SyncConfig {
                max_retries: 3,
                retry_backoff_ms: 1,
            },
            taxonomy: TaxonomyConfig::default(),
            products: BTreeMap::new(),
        }
    }

    fn write_source(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    const REDIS_BATCH: &str = r#"[
        {
            "database": "Redis",
            "major_version": "7",
            "patch_version": "7.2.0",
            "date": "2023-08-15",
            "changes": ["Fix crash in cluster failover", "Improve latency of SCAN"]
        },
        {
            "database": "Redis",
            "major_version": "7",
            "patch_version": "7.2.1",
            "date": "2023-09-06",
            "changes": ["Fix CVE-2023-41053 vulnerability in SORT_RO"]
        }
    ]"#;

    #[tokio::test]
    async fn test_run_ingests_array_and_object_files() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "redis.json", REDIS_BATCH);
        write_source(
            &dir,
            "mongodb.json",
            r#"{
                "database": "MongoDB",
                "patch_version": "8.0.1",
                "date": "2024-10-21",
                "changes": ["Add support for vector index and similarity search"]
            }"#,
        );
        let store = MemoryStore::new();

        let outcome = run_pipeline(dir.path(), &store, &test_config(), false, None)
            .await
            .unwrap();
        assert_eq!(outcome.files, 2);
        assert_eq!(outcome.bad_files, 0);
        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.report.inserted, 3);
        assert_eq!(outcome.conflicts, 0);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_run_surfaces_store_duplicate_conflicts() {
        let sources = TempDir::new().unwrap();
        write_source(&sources, "redis.json", REDIS_BATCH);
        let data = TempDir::new().unwrap();
        let mut config = test_config();
        config.db.path = data.path().join("pwatch.sqlite");

        // A store written out-of-band, missing the unique key and already
        // holding the same (product, patch_version) twice.
        let pool = crate::db::connect(&config).await.unwrap();
        sqlx::query(
            "CREATE TABLE releases (
                id TEXT PRIMARY KEY,
                product TEXT NOT NULL,
                major_version TEXT NOT NULL,
                patch_version TEXT NOT NULL,
                release_date TEXT,
                record_json TEXT NOT NULL,
                synced_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE products (
                product TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                kind TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        for id in ["a", "b"] {
            sqlx::query(
                "INSERT INTO releases
                 (id, product, major_version, patch_version, release_date, record_json, synced_at)
                 VALUES (?, 'Cassandra', '4.1', '4.1.3', '2023-07-24', '{}', 0)",
            )
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        }
        let store = crate::sqlite_store::SqliteStore::new(pool);

        let outcome = run_pipeline(sources.path(), &store, &config, false, None)
            .await
            .unwrap();
        assert_eq!(outcome.report.inserted, 2);
        assert_eq!(outcome.conflicts, 1);
        store.close().await;
    }

    #[tokio::test]
    async fn test_bad_file_skipped_without_aborting() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "redis.json", REDIS_BATCH);
        write_source(&dir, "broken.json", "{not json");
        let store = MemoryStore::new();

        let outcome = run_pipeline(dir.path(), &store, &test_config(), false, None)
            .await
            .unwrap();
        assert_eq!(outcome.files, 1);
        assert_eq!(outcome.bad_files, 1);
        assert_eq!(outcome.report.inserted, 2);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "redis.json", REDIS_BATCH);
        let store = MemoryStore::new();

        let outcome = run_pipeline(dir.path(), &store, &test_config(), true, None)
            .await
            .unwrap();
        assert_eq!(outcome.report.inserted, 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_second_run_inserts_nothing() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "redis.json", REDIS_BATCH);
        let store = MemoryStore::new();
        let config = test_config();

        run_pipeline(dir.path(), &store, &config, false, None)
            .await
            .unwrap();
        let outcome = run_pipeline(dir.path(), &store, &config, false, None)
            .await
            .unwrap();
        assert_eq!(outcome.report.inserted, 0);
        assert_eq!(outcome.report.skipped, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_limit_caps_processed_records() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "redis.json", REDIS_BATCH);
        let store = MemoryStore::new();

        let outcome = run_pipeline(dir.path(), &store, &test_config(), false, Some(1))
            .await
            .unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_record_dropped() {
        let dir = TempDir::new().unwrap();
        write_source(
            &dir,
            "mixed.json",
            r#"[
                {"database": "TiDB", "patch_version": "8.5.0", "changes": ["Fix planner bug"]},
                {"database": "TiDB", "changes": ["No patch version here"]}
            ]"#,
        );
        let store = MemoryStore::new();

        let outcome = run_pipeline(dir.path(), &store, &test_config(), false, None)
            .await
            .unwrap();
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.report.inserted, 1);
    }

    #[test]
    fn test_enriched_record_carries_all_summaries() {
        let taxonomy = Taxonomy::default();
        let classifier = Classifier::new(&taxonomy);
        let deriver = AlertDeriver::new(&taxonomy);
        let tagger = InnovationTagger::new(&taxonomy);
        let release = ReleaseRecord {
            product: "Neo4j".to_string(),
            major_version: "5".to_string(),
            patch_version: "5.26.0".to_string(),
            release_date: None,
            changes: vec![
                "Add vector similarity search with HNSW index".to_string(),
                "Fix security vulnerability CVE-2024-34517".to_string(),
            ],
        };

        let enriched = enrich_record(&release, &classifier, &deriver, &tagger);
        assert_eq!(enriched.key(), ("Neo4j".to_string(), "5.26.0".to_string()));
        assert_eq!(enriched.date, crate::models::UNKNOWN_DATE_MARKER);
        assert_eq!(enriched.ai_analysis.details.len(), 2);
        assert_eq!(enriched.alerts.critical_count, 1);
        assert!(enriched.innovation_summary.total_innovations >= 1);
    }
}
