//! Pipeline error taxonomy.
//!
//! Locally recoverable conditions (a malformed record, an unparsable date,
//! a transient store error) are logged and skipped or retried by their
//! callers; a taxonomy mismatch indicates a configuration bug and is
//! surfaced as a hard failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A harvester record is missing a required field. The record is
    /// dropped and the batch continues.
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// A `(product, patch_version)` key appears more than once in the
    /// persistent store. Reported as a data-quality signal, never
    /// auto-resolved.
    #[error("duplicate key in store: {product} {patch_version} ({count} occurrences)")]
    DuplicateKeyConflict {
        product: String,
        patch_version: String,
        count: i64,
    },

    /// The persistent store could not be reached after bounded retries.
    /// Fails the affected record without aborting sibling records.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    /// A taxonomy override names a category or theme outside the declared
    /// closed set. This is an internal invariant violation and fatal.
    #[error("unknown taxonomy entry: '{name}'")]
    TaxonomyMismatch { name: String },
}
