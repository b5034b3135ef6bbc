//! Storage abstraction for enriched release records.
//!
//! The [`Store`] trait defines the operations the synchronizer and the
//! read commands need, enabling pluggable backends (SQLite, in-memory for
//! tests). Implementations must be `Send + Sync` to work with async
//! runtimes.
//!
//! The store is append-only with respect to already-seen patches: an
//! insert for an existing `(product, patch_version)` key must be refused
//! by the backend's uniqueness guarantee, and [`Store::insert_new`]
//! reports it as "not inserted" rather than an error.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::catalog::ProductClass;
use crate::models::EnrichedRecord;

/// A `(product, patch_version)` key appearing more than once in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub product: String,
    pub patch_version: String,
    pub count: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Every `(product, patch_version)` key currently stored.
    async fn existing_keys(&self) -> Result<HashSet<(String, String)>>;

    /// Insert one record unless its key is already present. Returns `true`
    /// when a row was written, `false` when the key already existed
    /// (idempotent retry, not an error).
    async fn insert_new(&self, record: &EnrichedRecord) -> Result<bool>;

    /// Integrity scan: keys stored more than once.
    async fn find_duplicates(&self) -> Result<Vec<DuplicateKey>>;

    /// Distinct product identifiers, sorted.
    async fn list_products(&self) -> Result<Vec<String>>;

    /// All enriched records for one product.
    async fn records_for(&self, product: &str) -> Result<Vec<EnrichedRecord>>;

    /// Every stored record.
    async fn all_records(&self) -> Result<Vec<EnrichedRecord>>;

    /// Write or update one product's classification metadata.
    async fn upsert_product_class(&self, product: &str, class: ProductClass) -> Result<()>;
}

/// In-memory store used by unit tests.
///
/// Keyed storage makes duplicates structurally impossible, mirroring the
/// SQLite unique constraint. `fail_inserts` makes the next N insert calls
/// fail, for exercising the synchronizer's bounded retry.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<(String, String), EnrichedRecord>>,
    classes: Mutex<BTreeMap<String, ProductClass>>,
    fail_inserts: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls to `insert_new` fail with a transient error.
    pub fn fail_inserts(&self, n: u32) {
        self.fail_inserts.store(n, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn existing_keys(&self) -> Result<HashSet<(String, String)>> {
        Ok(self.records.lock().unwrap().keys().cloned().collect())
    }

    async fn insert_new(&self, record: &EnrichedRecord) -> Result<bool> {
        let remaining = self.fail_inserts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_inserts.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("simulated store outage");
        }
        let mut records = self.records.lock().unwrap();
        match records.entry(record.key()) {
            std::collections::btree_map::Entry::Occupied(_) => Ok(false),
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn find_duplicates(&self) -> Result<Vec<DuplicateKey>> {
        // Keyed storage cannot hold duplicates.
        Ok(Vec::new())
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let records = self.records.lock().unwrap();
        let mut products: Vec<String> =
            records.keys().map(|(product, _)| product.clone()).collect();
        products.dedup();
        Ok(products)
    }

    async fn records_for(&self, product: &str) -> Result<Vec<EnrichedRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| r.database == product)
            .cloned()
            .collect())
    }

    async fn all_records(&self) -> Result<Vec<EnrichedRecord>> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn upsert_product_class(&self, product: &str, class: ProductClass) -> Result<()> {
        self.classes
            .lock()
            .unwrap()
            .insert(product.to_string(), class);
        Ok(())
    }
}
