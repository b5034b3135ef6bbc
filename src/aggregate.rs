//! Hierarchical aggregation of enriched release records.
//!
//! Pure functions rolling per-patch results into per-minor-version,
//! per-major-version, per-product, and global statistics. Aggregation is
//! strictly additive and recomputed bottom-up from child records on every
//! run — never patched in place — so re-classifying history can never
//! leave stale totals at a higher level.

use std::collections::BTreeMap;

use crate::models::{AlertLevel, Category, EnrichedRecord, Theme};
use crate::normalize::minor_version_of;

/// Summed counts at one level of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    /// Number of patch releases covered.
    pub patches: u64,
    /// Per-change category tallies summed over all covered releases.
    pub categories: BTreeMap<Category, u64>,
    /// How many covered releases had each dominant type.
    pub dominant_types: BTreeMap<Category, u64>,
    /// Alert counts per severity level.
    pub alert_levels: BTreeMap<AlertLevel, u64>,
    /// Innovation theme tallies.
    pub themes: BTreeMap<Theme, u64>,
}

impl AggregateStats {
    /// Leaf stats for a single enriched release.
    pub fn from_record(record: &EnrichedRecord) -> AggregateStats {
        let mut stats = AggregateStats {
            patches: 1,
            categories: record.ai_analysis.summary.clone(),
            ..Default::default()
        };
        *stats
            .dominant_types
            .entry(record.ai_analysis.dominant_type)
            .or_insert(0) += 1;
        stats
            .alert_levels
            .insert(AlertLevel::Critical, record.alerts.critical_count);
        stats
            .alert_levels
            .insert(AlertLevel::High, record.alerts.high_count);
        stats
            .alert_levels
            .insert(AlertLevel::Medium, record.alerts.medium_count);
        stats
            .alert_levels
            .insert(AlertLevel::Low, record.alerts.low_count);
        stats.themes = record.innovation_summary.category_counts.clone();
        stats
    }

    /// Element-wise addition of child counts into `self`.
    pub fn absorb(&mut self, other: &AggregateStats) {
        self.patches += other.patches;
        for (k, v) in &other.categories {
            *self.categories.entry(*k).or_insert(0) += v;
        }
        for (k, v) in &other.dominant_types {
            *self.dominant_types.entry(*k).or_insert(0) += v;
        }
        for (k, v) in &other.alert_levels {
            *self.alert_levels.entry(*k).or_insert(0) += v;
        }
        for (k, v) in &other.themes {
            *self.themes.entry(*k).or_insert(0) += v;
        }
    }

    pub fn total_alerts(&self) -> u64 {
        self.alert_levels.values().sum()
    }

    pub fn total_innovations(&self) -> u64 {
        self.themes.values().sum()
    }
}

/// Stats for one minor version: per-patch leaves plus their sum.
#[derive(Debug, Clone, Default)]
pub struct MinorStats {
    pub patches: BTreeMap<String, AggregateStats>,
    pub totals: AggregateStats,
}

/// Stats for one major version: per-minor children plus their sum.
#[derive(Debug, Clone, Default)]
pub struct MajorStats {
    pub minors: BTreeMap<String, MinorStats>,
    pub totals: AggregateStats,
}

/// Stats for one product: per-major children plus their sum.
#[derive(Debug, Clone, Default)]
pub struct ProductStats {
    pub majors: BTreeMap<String, MajorStats>,
    pub totals: AggregateStats,
}

/// Stats across every tracked product.
#[derive(Debug, Clone, Default)]
pub struct GlobalStats {
    pub products: BTreeMap<String, ProductStats>,
    pub totals: AggregateStats,
}

/// Roll one product's enriched records up through patch, minor, and major
/// levels. Pure: same records in, same stats out.
pub fn aggregate_product(records: &[EnrichedRecord]) -> ProductStats {
    let mut product = ProductStats::default();

    for record in records {
        let leaf = AggregateStats::from_record(record);
        let major = product
            .majors
            .entry(record.major_version.clone())
            .or_default();
        let minor = major
            .minors
            .entry(minor_version_of(&record.patch_version))
            .or_default();
        minor
            .patches
            .insert(record.patch_version.clone(), leaf);
    }

    // Bottom-up recomputation: sums flow patch -> minor -> major -> product.
    for major in product.majors.values_mut() {
        for minor in major.minors.values_mut() {
            let mut totals = AggregateStats::default();
            for leaf in minor.patches.values() {
                totals.absorb(leaf);
            }
            minor.totals = totals;
            major.totals.absorb(&minor.totals);
        }
        product.totals.absorb(&major.totals);
    }

    product
}

/// Reduce per-product stats to the global level.
pub fn aggregate_global(by_product: BTreeMap<String, ProductStats>) -> GlobalStats {
    let mut global = GlobalStats::default();
    for stats in by_product.values() {
        global.totals.absorb(&stats.totals);
    }
    global.products = by_product;
    global
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::models::ReleaseRecord;
    use crate::taxonomy::Taxonomy;
    use crate::{alerts::AlertDeriver, innovation::InnovationTagger};

    fn enrich(product: &str, major: &str, patch: &str, changes: &[&str]) -> EnrichedRecord {
        let taxonomy = Taxonomy::default();
        let classifier = Classifier::new(&taxonomy);
        let deriver = AlertDeriver::new(&taxonomy);
        let tagger = InnovationTagger::new(&taxonomy);
        let record = ReleaseRecord {
            product: product.to_string(),
            major_version: major.to_string(),
            patch_version: patch.to_string(),
            release_date: None,
            changes: changes.iter().map(|c| c.to_string()).collect(),
        };
        let ai_analysis = classifier.analyze_patch(&record);
        let alerts = deriver.summarize(&record.changes);
        let innovation_summary = tagger.summarize(&ai_analysis.details);
        EnrichedRecord {
            database: record.product,
            major_version: record.major_version,
            patch_version: record.patch_version,
            date: crate::models::format_release_date(record.release_date),
            changes: record.changes,
            ai_analysis,
            alerts,
            innovation_summary,
        }
    }

    #[test]
    fn test_hierarchy_grouping() {
        let records = vec![
            enrich("MongoDB", "7.0", "7.0.1", &["Fix crash on startup"]),
            enrich("MongoDB", "7.0", "7.0.2", &["Add new aggregation stage"]),
            enrich("MongoDB", "8.0", "8.0.1", &["Improve query cache"]),
        ];
        let stats = aggregate_product(&records);
        assert_eq!(stats.majors.len(), 2);
        assert_eq!(stats.totals.patches, 3);
        assert_eq!(stats.majors["7.0"].totals.patches, 2);
        assert_eq!(stats.majors["7.0"].minors["7.0"].patches.len(), 2);
    }

    #[test]
    fn test_rollup_is_additive() {
        let a = vec![
            enrich("Redis", "7.2", "7.2.1", &["Fix AOF rewrite crash"]),
            enrich("Redis", "7.2", "7.2.2", &["Improve eviction latency"]),
        ];
        let b = vec![enrich(
            "Redis",
            "7.4",
            "7.4.0",
            &["Add vector index for embedding similarity"],
        )];

        let mut union: Vec<EnrichedRecord> = a.clone();
        union.extend(b.clone());

        let mut summed = aggregate_product(&a).totals;
        summed.absorb(&aggregate_product(&b).totals);

        assert_eq!(aggregate_product(&union).totals, summed);
    }

    #[test]
    fn test_recomputed_not_incremental() {
        // Aggregating twice from the same children yields identical totals;
        // nothing is carried over between runs.
        let records = vec![enrich("TiDB", "8.1", "8.1.1", &["Fix deadlock in DDL"])];
        let first = aggregate_product(&records);
        let second = aggregate_product(&records);
        assert_eq!(first.totals, second.totals);
    }

    #[test]
    fn test_global_reduction() {
        let mut by_product = BTreeMap::new();
        by_product.insert(
            "Redis".to_string(),
            aggregate_product(&[enrich("Redis", "7.2", "7.2.1", &["Fix crash"])]),
        );
        by_product.insert(
            "Neo4j".to_string(),
            aggregate_product(&[enrich("Neo4j", "5.15", "5.15.0", &["Add new index type"])]),
        );
        let global = aggregate_global(by_product);
        assert_eq!(global.totals.patches, 2);
        assert_eq!(global.products.len(), 2);
    }
}
