//! Core data models used throughout patchwatch.
//!
//! These types represent the release records, per-change classifications,
//! alerts, and innovation tags that flow through the analysis and sync
//! pipeline. Wire field names match the harvester input and the persisted
//! store shape (`database`, `patch_version`, `ai_analysis`, ...).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker the harvester emits when a release date could not be scraped.
pub const UNKNOWN_DATE_MARKER: &str = "Date non disponible";

/// Primary classification label for a single change description.
///
/// Declaration order is significant: score ties are broken by the
/// first-declared category, and serialized count maps iterate in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Performance,
    BugFix,
    NewFeature,
    Security,
    Refactoring,
    Maintenance,
    Monitoring,
    Configuration,
    Testing,
    Other,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 10] = [
        Category::Performance,
        Category::BugFix,
        Category::NewFeature,
        Category::Security,
        Category::Refactoring,
        Category::Maintenance,
        Category::Monitoring,
        Category::Configuration,
        Category::Testing,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::BugFix => "bug_fix",
            Category::NewFeature => "new_feature",
            Category::Security => "security",
            Category::Refactoring => "refactoring",
            Category::Maintenance => "maintenance",
            Category::Monitoring => "monitoring",
            Category::Configuration => "configuration",
            Category::Testing => "testing",
            Category::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

/// Alert severity, highest first. A change never carries more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Critical,
        AlertLevel::High,
        AlertLevel::Medium,
        AlertLevel::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "critical",
            AlertLevel::High => "high",
            AlertLevel::Medium => "medium",
            AlertLevel::Low => "low",
        }
    }
}

/// Alert type tag. Orthogonal to severity: a change can be tagged
/// `vulnerability` and still be only `low` severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Vulnerability,
    Performance,
    CriticalChange,
}

/// Emerging-technology theme for multi-label innovation tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    VectorSearch,
    MemoryAcceleration,
    AiMlIntegration,
    DistributedComputing,
    QuantumComputing,
    BlockchainWeb3,
    EdgeComputing,
    SecurityPrivacy,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::VectorSearch,
        Theme::MemoryAcceleration,
        Theme::AiMlIntegration,
        Theme::DistributedComputing,
        Theme::QuantumComputing,
        Theme::BlockchainWeb3,
        Theme::EdgeComputing,
        Theme::SecurityPrivacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::VectorSearch => "vector_search",
            Theme::MemoryAcceleration => "memory_acceleration",
            Theme::AiMlIntegration => "ai_ml_integration",
            Theme::DistributedComputing => "distributed_computing",
            Theme::QuantumComputing => "quantum_computing",
            Theme::BlockchainWeb3 => "blockchain_web3",
            Theme::EdgeComputing => "edge_computing",
            Theme::SecurityPrivacy => "security_privacy",
        }
    }

    pub fn from_name(name: &str) -> Option<Theme> {
        Theme::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

/// Raw record as emitted by the harvester, one array per product.
///
/// Required fields are `Option` so that one incomplete record surfaces as
/// a `MalformedRecord` during normalization instead of failing the whole
/// file deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub database: Option<String>,
    #[serde(default)]
    pub major_version: Option<String>,
    pub patch_version: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Validated, canonical release record. One per `(product, patch_version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub product: String,
    pub major_version: String,
    pub patch_version: String,
    /// `None` is the explicit unknown-date marker. Consumers must order
    /// unknown dates last, never treat them as epoch or "now".
    pub release_date: Option<NaiveDate>,
    pub changes: Vec<String>,
}

/// A change description with its assigned category. Never mutated after
/// creation; re-running classification supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedChange {
    pub description: String,
    pub category: Category,
}

/// Per-release classification summary (`ai_analysis` in the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub dominant_type: Category,
    /// Category tally. Every category is present, zero included.
    pub summary: BTreeMap<Category, u64>,
    pub details: Vec<ClassifiedChange>,
}

/// A single derived alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub description: String,
    pub level: AlertLevel,
    #[serde(rename = "type")]
    pub types: Vec<AlertType>,
}

/// Per-release alert rollup (`alerts` in the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total_count: u64,
    pub critical_count: u64,
    pub high_count: u64,
    pub medium_count: u64,
    pub low_count: u64,
    pub alerts: Vec<AlertRecord>,
}

/// A change flagged with one or more innovation themes. The theme set is
/// non-empty by construction: no evidence, no tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationTag {
    pub description: String,
    pub categories: Vec<Theme>,
}

/// Share of one theme among all tagged innovations in a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendEntry {
    pub category: Theme,
    pub count: u64,
    pub percentage: f64,
}

/// Descriptive trend split: established (>20% share) vs emerging (5-20%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationTrends {
    pub established_trends: Vec<TrendEntry>,
    pub emerging_trends: Vec<TrendEntry>,
    pub category_frequency: BTreeMap<Theme, u64>,
}

/// Per-release innovation rollup (`innovation_summary` in the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationSummary {
    pub total_innovations: u64,
    pub categories_detected: Vec<Theme>,
    pub category_counts: BTreeMap<Theme, u64>,
    pub category_details: BTreeMap<Theme, Vec<ClassifiedChange>>,
    pub innovation_trends: InnovationTrends,
    pub top_innovations: Vec<InnovationTag>,
}

/// Fully enriched record: the harvester input plus everything this
/// pipeline derives. This is the persisted store shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub database: String,
    pub major_version: String,
    pub patch_version: String,
    /// ISO date, or [`UNKNOWN_DATE_MARKER`] when the release date is unknown.
    pub date: String,
    pub changes: Vec<String>,
    pub ai_analysis: AnalysisSummary,
    pub alerts: AlertSummary,
    pub innovation_summary: InnovationSummary,
}

impl EnrichedRecord {
    /// The store's unique key.
    pub fn key(&self) -> (String, String) {
        (self.database.clone(), self.patch_version.clone())
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Render an optional release date for persistence.
pub fn format_release_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => UNKNOWN_DATE_MARKER.to_string(),
    }
}
