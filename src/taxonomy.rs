//! Keyword taxonomy for classification, alerting, and innovation tagging.
//!
//! The taxonomy is an explicit immutable value built once and passed into
//! the analysis components at construction time, so multiple taxonomy
//! versions can coexist (notably in tests). It carries three independent
//! vocabularies:
//!
//! - per-category trigger keywords, matched as whole words
//!   (case-insensitive, compiled to `\b`-anchored regexes);
//! - alert vocabularies (type predicates plus the severity ladder),
//!   matched as case-insensitive substrings;
//! - per-theme innovation keywords, matched as case-insensitive substrings.
//!
//! Keyword lists can be overridden per category/theme from the TOML config;
//! an override naming an unknown category or theme is a configuration bug
//! and fails hard with [`PipelineError::TaxonomyMismatch`].

use regex::RegexBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::models::{Category, Theme};

/// One category's trigger keywords with their compiled matchers.
#[derive(Debug)]
pub struct CategoryRules {
    pub category: Category,
    pub keywords: Vec<String>,
    patterns: Vec<regex::Regex>,
}

impl CategoryRules {
    fn new(category: Category, keywords: &[&str]) -> Self {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        let patterns = compile_word_patterns(&keywords);
        CategoryRules {
            category,
            keywords,
            patterns,
        }
    }

    /// Number of distinct keywords matching `text` as whole words.
    pub fn score(&self, text: &str) -> usize {
        self.patterns.iter().filter(|p| p.is_match(text)).count()
    }
}

/// One theme's keywords, lowercased for substring matching.
#[derive(Debug)]
pub struct ThemeRules {
    pub theme: Theme,
    pub keywords: Vec<String>,
}

impl ThemeRules {
    fn new(theme: Theme, keywords: &[&str]) -> Self {
        ThemeRules {
            theme,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Keywords found in the (already lowercased) text.
    pub fn matches<'a>(&'a self, lower_text: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|k| lower_text.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect()
    }
}

/// Alert vocabularies: three independent type predicates plus the tiered
/// severity terms. All matched as lowercase substrings.
#[derive(Debug)]
pub struct AlertVocabulary {
    pub vulnerability: Vec<String>,
    pub performance: Vec<String>,
    pub critical_change: Vec<String>,
    pub critical_terms: Vec<String>,
    pub high_terms: Vec<String>,
    pub medium_terms: Vec<String>,
}

/// The full immutable taxonomy.
#[derive(Debug)]
pub struct Taxonomy {
    categories: Vec<CategoryRules>,
    pub alerts: AlertVocabulary,
    themes: Vec<ThemeRules>,
}

/// Optional keyword overrides loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyOverrides {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub themes: BTreeMap<String, Vec<String>>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Taxonomy {
            categories: default_category_rules(),
            alerts: default_alert_vocabulary(),
            themes: default_theme_rules(),
        }
    }
}

impl Taxonomy {
    /// Build the default taxonomy with per-category/theme keyword overrides
    /// applied. Unknown names are fatal.
    pub fn with_overrides(overrides: &TaxonomyOverrides) -> Result<Self, PipelineError> {
        let mut taxonomy = Taxonomy::default();

        for (name, keywords) in &overrides.categories {
            let category = Category::from_name(name).ok_or_else(|| {
                PipelineError::TaxonomyMismatch { name: name.clone() }
            })?;
            let rules = taxonomy
                .categories
                .iter_mut()
                .find(|r| r.category == category);
            match rules {
                Some(r) => {
                    let keyword_refs: Vec<&str> = keywords.iter().map(String::as_str).collect();
                    *r = CategoryRules::new(category, &keyword_refs);
                }
                // `other` carries no keywords and cannot be given any.
                None => {
                    return Err(PipelineError::TaxonomyMismatch { name: name.clone() });
                }
            }
        }

        for (name, keywords) in &overrides.themes {
            let theme = Theme::from_name(name).ok_or_else(|| {
                PipelineError::TaxonomyMismatch { name: name.clone() }
            })?;
            let rules = taxonomy
                .themes
                .iter_mut()
                .find(|r| r.theme == theme)
                .ok_or_else(|| PipelineError::TaxonomyMismatch { name: name.clone() })?;
            let keyword_refs: Vec<&str> = keywords.iter().map(String::as_str).collect();
            *rules = ThemeRules::new(theme, &keyword_refs);
        }

        Ok(taxonomy)
    }

    /// Category rules in declaration order (excludes `other`, which has
    /// no keywords by construction).
    pub fn categories(&self) -> &[CategoryRules] {
        &self.categories
    }

    pub fn themes(&self) -> &[ThemeRules] {
        &self.themes
    }
}

fn compile_word_patterns(keywords: &[String]) -> Vec<regex::Regex> {
    keywords
        .iter()
        .map(|kw| {
            RegexBuilder::new(&format!(r"\b{}\b", regex::escape(kw)))
                .case_insensitive(true)
                .build()
                .unwrap_or_else(|e| panic!("invalid keyword pattern '{}': {}", kw, e))
        })
        .collect()
}

fn default_category_rules() -> Vec<CategoryRules> {
    vec![
        CategoryRules::new(
            Category::Performance,
            &[
                "performance",
                "optimize",
                "optimization",
                "latency",
                "throughput",
                "scalability",
                "speed",
                "faster",
                "timeout",
                "eviction",
                "improve",
                "improving",
                "efficiency",
                "cache",
                "allocation",
                "contention",
                "bottleneck",
                "overhead",
                "reduce",
            ],
        ),
        CategoryRules::new(
            Category::BugFix,
            &[
                "fix",
                "fixed",
                "fixes",
                "bug",
                "bugs",
                "crash",
                "hang",
                "race",
                "deadlock",
                "error",
                "fail",
                "failure",
                "issue",
                "incorrect",
                "leak",
                "overflow",
                "corruption",
                "regression",
                "missing",
                "broken",
                "exception",
                "invalid",
                "wrong",
            ],
        ),
        CategoryRules::new(
            Category::NewFeature,
            &[
                "add",
                "added",
                "adds",
                "introduce",
                "new",
                "support",
                "enable",
                "feature",
                "initial",
                "allow",
                "implement",
                "create",
                "provide",
                "extend",
            ],
        ),
        CategoryRules::new(
            Category::Security,
            &[
                "security",
                "auth",
                "authentication",
                "authorization",
                "permission",
                "vulnerability",
                "cve",
                "encryption",
                "secure",
                "exploit",
                "credential",
                "certificate",
                "tls",
                "ssl",
            ],
        ),
        CategoryRules::new(
            Category::Refactoring,
            &[
                "refactor",
                "refactored",
                "restructure",
                "reorganize",
                "cleanup",
                "simplify",
                "modularize",
                "rework",
            ],
        ),
        CategoryRules::new(
            Category::Maintenance,
            &[
                "upgrade",
                "migrate",
                "migration",
                "compatibility",
                "deprecated",
                "deprecate",
                "deprecation",
                "remove",
                "removed",
                "replace",
                "legacy",
                "obsolete",
                "bump",
            ],
        ),
        CategoryRules::new(
            Category::Monitoring,
            &[
                "metric",
                "metrics",
                "log",
                "logging",
                "track",
                "tracing",
                "monitor",
                "monitoring",
                "observe",
                "report",
                "statistics",
                "telemetry",
            ],
        ),
        CategoryRules::new(
            Category::Configuration,
            &[
                "config",
                "configuration",
                "setting",
                "option",
                "parameter",
                "property",
                "tune",
                "default",
                "flag",
            ],
        ),
        CategoryRules::new(
            Category::Testing,
            &[
                "test",
                "tests",
                "testing",
                "verify",
                "validate",
                "assert",
                "benchmark",
                "fixture",
            ],
        ),
    ]
}

fn default_alert_vocabulary() -> AlertVocabulary {
    AlertVocabulary {
        vulnerability: to_lower(&[
            "security",
            "vulnerability",
            "cve",
            "exploit",
            "attack",
            "breach",
            "authentication",
            "authorization",
            "privilege escalation",
            "injection",
            "xss",
            "csrf",
            "sql injection",
            "remote code execution",
            "rce",
            "buffer overflow",
            "memory corruption",
            "denial of service",
            "cryptographic",
            "encryption",
            "tls",
            "ssl",
            "certificate",
            "credential",
            "password",
            "token",
            "jwt",
            "oauth",
            "saml",
            "firewall",
            "malware",
            "backdoor",
            "rootkit",
        ]),
        performance: to_lower(&[
            "performance",
            "optimization",
            "improve",
            "speed",
            "slow",
            "latency",
            "throughput",
            "benchmark",
            "scalability",
            "memory",
            "cpu",
            "disk",
            "network",
            "cache",
            "index",
            "query",
            "execution",
            "concurrency",
            "parallel",
            "async",
            "batch",
            "pool",
            "connection",
            "compression",
            "serialization",
            "garbage collection",
            "heap",
            "allocation",
            "leak",
            "bottleneck",
            "hotspot",
            "critical path",
            "utilization",
        ]),
        critical_change: to_lower(&[
            "critical",
            "major",
            "breaking",
            "incompatible",
            "deprecation",
            "removal",
            "discontinued",
            "obsolete",
            "legacy",
            "migration",
            "upgrade",
            "downgrade",
            "compatibility",
            "stability",
            "reliability",
            "crash",
            "hang",
            "deadlock",
            "timeout",
            "failure",
            "error",
            "exception",
            "panic",
            "abort",
            "terminate",
            "shutdown",
            "restart",
        ]),
        critical_terms: to_lower(&[
            "cve",
            "exploit",
            "rce",
            "remote code execution",
            "privilege escalation",
            "crash",
            "security",
        ]),
        high_terms: to_lower(&[
            "breaking",
            "incompatible",
            "major performance",
            "critical performance",
            "deprecation",
        ]),
        medium_terms: to_lower(&[
            "performance",
            "optimization",
            "improve",
            "major",
            "significant",
        ]),
    }
}

fn default_theme_rules() -> Vec<ThemeRules> {
    vec![
        ThemeRules::new(
            Theme::VectorSearch,
            &[
                "vector",
                "embedding",
                "similarity",
                "nearest neighbor",
                "ann",
                "approximate nearest",
                "vector search",
                "vector index",
                "embedding search",
                "faiss",
                "hnsw",
                "product quantization",
                "semantic search",
                "vector database",
                "dot product",
                "cosine similarity",
                "euclidean distance",
                "vector query",
                "vector quantization",
            ],
        ),
        ThemeRules::new(
            Theme::MemoryAcceleration,
            &[
                "memory",
                "cache",
                "acceleration",
                "ram",
                "buffer",
                "pool",
                "allocation",
                "in-memory",
                "memory-mapped",
                "mmap",
                "shared memory",
                "garbage collection",
                "gc",
                "heap",
                "memory leak",
                "memory footprint",
                "memory pool",
                "prefetch",
                "memory bandwidth",
                "persistent memory",
                "non-volatile memory",
            ],
        ),
        ThemeRules::new(
            Theme::AiMlIntegration,
            &[
                "ai",
                "ml",
                "machine learning",
                "artificial intelligence",
                "neural network",
                "deep learning",
                "inference",
                "training",
                "prediction",
                "tensorflow",
                "pytorch",
                "onnx",
                "model serving",
                "feature store",
                "mlops",
                "gpu",
                "cuda",
                "tensor",
                "vectorization",
                "distributed training",
            ],
        ),
        ThemeRules::new(
            Theme::DistributedComputing,
            &[
                "distributed",
                "cluster",
                "shard",
                "partition",
                "replica",
                "consensus",
                "raft",
                "paxos",
                "gossip",
                "leader election",
                "load balancing",
                "horizontal scaling",
                "elastic scaling",
                "auto-scaling",
                "microservices",
                "kubernetes",
                "docker",
                "container",
                "parallel processing",
                "concurrent",
                "async",
                "event-driven",
                "stream processing",
            ],
        ),
        ThemeRules::new(
            Theme::QuantumComputing,
            &[
                "quantum",
                "qubit",
                "quantum computing",
                "quantum algorithm",
                "quantum annealing",
                "quantum cryptography",
                "quantum key distribution",
            ],
        ),
        ThemeRules::new(
            Theme::BlockchainWeb3,
            &[
                "blockchain",
                "web3",
                "smart contract",
                "decentralized",
                "dapp",
                "cryptocurrency",
                "nft",
                "wallet",
                "proof of work",
                "proof of stake",
                "defi",
                "ethereum",
                "distributed ledger",
                "staking",
            ],
        ),
        ThemeRules::new(
            Theme::EdgeComputing,
            &[
                "edge",
                "edge computing",
                "iot",
                "internet of things",
                "edge device",
                "fog computing",
                "edge analytics",
                "edge inference",
                "real-time processing",
                "low latency",
                "edge gateway",
                "embedded systems",
                "microcontroller",
                "sensor",
            ],
        ),
        ThemeRules::new(
            Theme::SecurityPrivacy,
            &[
                "zero-knowledge",
                "homomorphic encryption",
                "differential privacy",
                "privacy-preserving",
                "privacy",
                "cryptography",
                "anonymous",
                "confidential",
                "access control",
                "biometric",
                "multi-factor",
                "zero-trust",
            ],
        ),
    ]
}

fn to_lower(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}
