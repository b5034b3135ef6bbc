//! Per-product classification metadata.
//!
//! Each tracked product carries a storage-model category (document, graph,
//! key-value, ...) and a kind (NewSQL vs NoSQL). The catalog ships with
//! defaults for the tracked databases and accepts config overrides; it is
//! persisted alongside the release records so read-side consumers can
//! join on it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage-model category of a tracked product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    KeyValue,
    DistributedSql,
    Columnar,
    Document,
    Graph,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::KeyValue => "key_value",
            ProductCategory::DistributedSql => "distributed_sql",
            ProductCategory::Columnar => "columnar",
            ProductCategory::Document => "document",
            ProductCategory::Graph => "graph",
        }
    }
}

/// Broad family of a tracked product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductKind {
    #[serde(rename = "NewSQL")]
    NewSql,
    #[serde(rename = "NoSQL")]
    NoSql,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::NewSql => "NewSQL",
            ProductKind::NoSql => "NoSQL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductClass {
    pub category: ProductCategory,
    pub kind: ProductKind,
}

/// Catalog of known products, keyed case-insensitively by product name.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    entries: BTreeMap<String, ProductClass>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        use ProductCategory::*;
        use ProductKind::*;
        let defaults = [
            ("Redis", KeyValue, NoSql),
            ("CockroachDB", DistributedSql, NewSql),
            ("TiDB", DistributedSql, NewSql),
            ("YugabyteDB", DistributedSql, NewSql),
            ("Cassandra", Columnar, NoSql),
            ("MongoDB", Document, NoSql),
            ("Neo4j", Graph, NewSql),
        ];
        let entries = defaults
            .into_iter()
            .map(|(name, category, kind)| {
                (name.to_lowercase(), ProductClass { category, kind })
            })
            .collect();
        ProductCatalog { entries }
    }
}

impl ProductCatalog {
    /// Default catalog with per-product overrides (or additions) applied.
    pub fn with_overrides(overrides: &BTreeMap<String, ProductClass>) -> ProductCatalog {
        let mut catalog = ProductCatalog::default();
        for (name, class) in overrides {
            catalog.entries.insert(name.to_lowercase(), *class);
        }
        catalog
    }

    /// Classification for a product name, if it is a known product.
    pub fn classify(&self, product: &str) -> Option<ProductClass> {
        self.entries.get(&product.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_product_case_insensitive() {
        let catalog = ProductCatalog::default();
        let class = catalog.classify("mongodb").unwrap();
        assert_eq!(class.category, ProductCategory::Document);
        assert_eq!(class.kind, ProductKind::NoSql);
        assert_eq!(catalog.classify("MongoDB").unwrap(), class);
    }

    #[test]
    fn test_unknown_product() {
        let catalog = ProductCatalog::default();
        assert!(catalog.classify("ScyllaDB").is_none());
    }

    #[test]
    fn test_overrides_extend_catalog() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "ScyllaDB".to_string(),
            ProductClass {
                category: ProductCategory::Columnar,
                kind: ProductKind::NoSql,
            },
        );
        let catalog = ProductCatalog::with_overrides(&overrides);
        assert!(catalog.classify("scylladb").is_some());
    }
}
