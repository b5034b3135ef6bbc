//! Incremental synchronization of enriched records into the store.
//!
//! Only records whose `(product, patch_version)` key is not already stored
//! are written. The key set fetched up front is an optimization; the
//! store's own uniqueness guarantee remains authoritative, so a concurrent
//! writer or a stale key set degrades to a skip, never a duplicate.
//! A record that keeps failing after bounded retries is reported and does
//! not abort its siblings.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::PipelineError;
use crate::models::EnrichedRecord;
use crate::store::Store;

/// Outcome of one synchronization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl SyncReport {
    pub fn total(&self) -> u64 {
        self.inserted + self.skipped + self.failed
    }
}

/// Write every not-yet-stored record, skipping keys that are already
/// present in the store or earlier in the same batch.
pub async fn sync_records(
    records: &[EnrichedRecord],
    store: &dyn Store,
    config: &SyncConfig,
) -> Result<SyncReport> {
    let mut seen = store
        .existing_keys()
        .await
        .context("Failed to read existing keys from store")?;

    let mut report = SyncReport::default();
    for record in records {
        let key = record.key();
        if seen.contains(&key) {
            debug!(
                product = %record.database,
                patch = %record.patch_version,
                "Skipping already synced record"
            );
            report.skipped += 1;
            continue;
        }
        match insert_with_retry(store, record, config).await {
            Ok(true) => {
                report.inserted += 1;
                seen.insert(key);
            }
            Ok(false) => {
                // The store saw the key even though the snapshot did not.
                report.skipped += 1;
                seen.insert(key);
            }
            Err(err) => {
                warn!(
                    product = %record.database,
                    patch = %record.patch_version,
                    error = %err,
                    "Giving up on record after retries"
                );
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

async fn insert_with_retry(
    store: &dyn Store,
    record: &EnrichedRecord,
    config: &SyncConfig,
) -> Result<bool> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match store.insert_new(record).await {
            Ok(written) => return Ok(written),
            Err(err) if attempt < config.max_retries => {
                warn!(
                    product = %record.database,
                    patch = %record.patch_version,
                    attempt,
                    error = %err,
                    "Store write failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(config.retry_backoff_ms)).await;
            }
            Err(err) => return Err(PipelineError::StoreUnavailable(err).into()),
        }
    }
}

/// Scan the store for keys that appear more than once.
pub async fn check_integrity(store: &dyn Store) -> Result<Vec<PipelineError>> {
    let duplicates = store
        .find_duplicates()
        .await
        .context("Failed to scan store for duplicates")?;
    Ok(duplicates
        .into_iter()
        .map(|dup| PipelineError::DuplicateKeyConflict {
            product: dup.product,
            patch_version: dup.patch_version,
            count: dup.count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertDeriver;
    use crate::classify::Classifier;
    use crate::innovation::InnovationTagger;
    use crate::models::{format_release_date, ReleaseRecord};
    use crate::store::MemoryStore;
    use crate::taxonomy::Taxonomy;

    fn enriched(product: &str, patch: &str) -> EnrichedRecord {
        let taxonomy = Taxonomy::default();
        let classifier = Classifier::new(&taxonomy);
        let deriver = AlertDeriver::new(&taxonomy);
        let tagger = InnovationTagger::new(&taxonomy);
        let record = ReleaseRecord {
            product: product.to_string(),
            major_version: patch.split('.').next().unwrap_or("0").to_string(),
            patch_version: patch.to_string(),
            release_date: None,
            changes: vec!["Fix memory leak in background compaction".to_string()],
        };
        let analysis = classifier.analyze_patch(&record);
        let alerts = deriver.summarize(&record.changes);
        let innovation_summary = tagger.summarize(&analysis.details);
        EnrichedRecord {
            database: record.product.clone(),
            major_version: record.major_version.clone(),
            patch_version: record.patch_version.clone(),
            date: format_release_date(record.release_date),
            changes: record.changes.clone(),
            ai_analysis: analysis,
            alerts,
            innovation_summary,
        }
    }

    fn fast_config() -> SyncConfig {
        SyncConfig {
            max_retries: 3,
            retry_backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_first_run_inserts_everything() {
        let store = MemoryStore::new();
        let batch = vec![enriched("Redis", "7.2.0"), enriched("Redis", "7.2.1")];

        let report = sync_records(&batch, &store, &fast_config()).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let store = MemoryStore::new();
        let batch = vec![enriched("MongoDB", "8.0.0")];

        sync_records(&batch, &store, &fast_config()).await.unwrap();
        let report = sync_records(&batch, &store, &fast_config()).await.unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_in_batch_duplicate_written_once() {
        let store = MemoryStore::new();
        let batch = vec![enriched("TiDB", "8.5.0"), enriched("TiDB", "8.5.0")];

        let report = sync_records(&batch, &store, &fast_config()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let store = MemoryStore::new();
        store.fail_inserts(1);
        let batch = vec![enriched("Cassandra", "5.0.2")];

        let report = sync_records(&batch, &store, &fast_config()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_skips_record_not_batch() {
        let store = MemoryStore::new();
        // First record burns all three attempts, second record succeeds.
        store.fail_inserts(3);
        let batch = vec![enriched("Neo4j", "5.26.0"), enriched("Neo4j", "5.26.1")];

        let report = sync_records(&batch, &store, &fast_config()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_integrity_scan_clean_store() {
        let store = MemoryStore::new();
        sync_records(&[enriched("Redis", "7.2.0")], &store, &fast_config())
            .await
            .unwrap();
        let conflicts = check_integrity(&store).await.unwrap();
        assert!(conflicts.is_empty());
    }
}
