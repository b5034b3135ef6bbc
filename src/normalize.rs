//! Record normalization.
//!
//! Validates and canonicalizes raw harvester records: rejects records with
//! no product or patch version, strips blank change entries, derives a
//! missing major version from the patch version, and turns absent or
//! unparsable dates into the explicit unknown-date marker (never a default
//! date). Also provides [`VersionKey`], the comparable ordering key for
//! patch versions.

use chrono::NaiveDate;
use std::cmp::Ordering;
use tracing::warn;

use crate::error::PipelineError;
use crate::models::{RawRecord, ReleaseRecord, UNKNOWN_DATE_MARKER};

/// Comparable ordering key for a dotted version string.
///
/// Segments are compared pairwise left to right; a missing segment counts
/// as 0, and a non-numeric segment compares as 0. Construction never fails.
#[derive(Debug, Clone)]
pub struct VersionKey {
    segments: Vec<u64>,
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionKey {}

impl VersionKey {
    pub fn parse(version: &str) -> VersionKey {
        let segments = version
            .split('.')
            .map(|s| s.trim().parse::<u64>().unwrap_or(0))
            .collect();
        VersionKey { segments }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering key for release dates: known dates first (ascending), unknown
/// dates strictly last.
pub fn date_sort_key(date: Option<NaiveDate>) -> (bool, NaiveDate) {
    match date {
        Some(d) => (false, d),
        None => (true, NaiveDate::MAX),
    }
}

/// Minor-version grouping key: the first two dot-segments of a patch
/// version (`"7.0.26"` -> `"7.0"`).
pub fn minor_version_of(patch_version: &str) -> String {
    let mut parts = patch_version.splitn(3, '.');
    match (parts.next(), parts.next()) {
        (Some(a), Some(b)) => format!("{}.{}", a, b),
        (Some(a), None) => a.to_string(),
        _ => patch_version.to_string(),
    }
}

/// Normalize one raw record, or reject it as malformed.
pub fn normalize_record(raw: &RawRecord) -> Result<ReleaseRecord, PipelineError> {
    let product = match raw.database.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => {
            return Err(PipelineError::MalformedRecord {
                reason: "missing 'database' field".to_string(),
            })
        }
    };

    let patch_version = match raw.patch_version.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            return Err(PipelineError::MalformedRecord {
                reason: format!("missing 'patch_version' for product '{}'", product),
            })
        }
    };

    let major_version = match raw.major_version.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => minor_version_of(&patch_version),
    };

    let release_date = parse_release_date(raw.date.as_deref(), &product, &patch_version);

    let changes: Vec<String> = raw
        .changes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect();

    Ok(ReleaseRecord {
        product,
        major_version,
        patch_version,
        release_date,
        changes,
    })
}

/// Normalize a batch. Malformed records are dropped (warn-logged); the
/// batch continues. Returns the kept records and the dropped count.
pub fn normalize_batch(raws: &[RawRecord]) -> (Vec<ReleaseRecord>, u64) {
    let mut records = Vec::with_capacity(raws.len());
    let mut dropped = 0u64;
    for raw in raws {
        match normalize_record(raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("dropping record: {}", e);
                dropped += 1;
            }
        }
    }
    (records, dropped)
}

fn parse_release_date(
    date: Option<&str>,
    product: &str,
    patch_version: &str,
) -> Option<NaiveDate> {
    let raw = date.map(str::trim).filter(|d| !d.is_empty())?;
    if raw == UNKNOWN_DATE_MARKER {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            warn!(
                "unparsable date '{}' for {} {}; recording as unknown",
                raw, product, patch_version
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        database: Option<&str>,
        patch: Option<&str>,
        date: Option<&str>,
        changes: &[&str],
    ) -> RawRecord {
        RawRecord {
            database: database.map(String::from),
            major_version: None,
            patch_version: patch.map(String::from),
            date: date.map(String::from),
            changes: changes.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_version_key_ordering() {
        assert!(VersionKey::parse("7.0.26") > VersionKey::parse("7.0.9"));
        assert!(VersionKey::parse("7.1") > VersionKey::parse("7.0.26"));
        assert!(VersionKey::parse("10.0") > VersionKey::parse("9.9.9"));
    }

    #[test]
    fn test_version_key_missing_segments_pad_with_zero() {
        assert_eq!(VersionKey::parse("7.0"), VersionKey::parse("7.0.0"));
        assert!(VersionKey::parse("7.0.1") > VersionKey::parse("7.0"));
    }

    #[test]
    fn test_version_key_non_numeric_compares_as_zero() {
        assert_eq!(VersionKey::parse("7.x.1"), VersionKey::parse("7.0.1"));
        // Never panics on arbitrary input.
        let _ = VersionKey::parse("v2024-beta..");
    }

    #[test]
    fn test_minor_version_of() {
        assert_eq!(minor_version_of("7.0.26"), "7.0");
        assert_eq!(minor_version_of("7.0"), "7.0");
        assert_eq!(minor_version_of("7"), "7");
    }

    #[test]
    fn test_blank_changes_stripped() {
        let record = normalize_record(&raw(
            Some("Redis"),
            Some("7.2.1"),
            Some("2024-01-15"),
            &["Fix AOF rewrite", "", "   ", "Add RESP3 option"],
        ))
        .unwrap();
        assert_eq!(record.changes.len(), 2);
    }

    #[test]
    fn test_missing_product_rejected_batch_continues() {
        let raws = vec![
            raw(None, Some("1.0.0"), None, &["change"]),
            raw(Some("MongoDB"), Some("7.0.1"), None, &["change"]),
            raw(Some("MongoDB"), None, None, &["change"]),
        ];
        let (records, dropped) = normalize_batch(&raws);
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(records[0].product, "MongoDB");
    }

    #[test]
    fn test_unknown_date_is_explicit_marker_not_epoch() {
        let record = normalize_record(&raw(
            Some("Neo4j"),
            Some("5.15.0"),
            Some(UNKNOWN_DATE_MARKER),
            &[],
        ))
        .unwrap();
        assert_eq!(record.release_date, None);

        let garbled = normalize_record(&raw(
            Some("Neo4j"),
            Some("5.15.0"),
            Some("sometime in 2024"),
            &[],
        ))
        .unwrap();
        assert_eq!(garbled.release_date, None);
    }

    #[test]
    fn test_unknown_date_orders_last() {
        let known = date_sort_key(NaiveDate::from_ymd_opt(2025, 11, 21));
        let unknown = date_sort_key(None);
        assert!(unknown > known);
    }

    #[test]
    fn test_major_version_derived_from_patch() {
        let record =
            normalize_record(&raw(Some("TiDB"), Some("8.1.2"), None, &[])).unwrap();
        assert_eq!(record.major_version, "8.1");
    }
}
