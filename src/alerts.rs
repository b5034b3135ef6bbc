//! Alert derivation: type predicates plus an exclusive severity ladder.
//!
//! Alert *type* and alert *severity* are orthogonal. Three independent
//! predicates tag a change as vulnerability-, performance-, or
//! critical-change-related; severity comes from a fixed priority ladder
//! evaluated top-down, first matching tier wins. A change can be tagged
//! `vulnerability` and still be only `low` severity when it misses the
//! hard-severity vocabulary.

use crate::models::{AlertLevel, AlertRecord, AlertSummary, AlertType};
use crate::taxonomy::Taxonomy;

pub struct AlertDeriver<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> AlertDeriver<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        AlertDeriver { taxonomy }
    }

    pub fn is_vulnerability_related(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.taxonomy.alerts.vulnerability)
    }

    pub fn is_performance_related(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.taxonomy.alerts.performance)
    }

    pub fn is_critical_change(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.taxonomy.alerts.critical_change)
    }

    /// Severity ladder, top-down, first matching tier wins:
    /// critical, then high, then medium, then low if any type predicate
    /// matched at all; otherwise no alert.
    fn assess_level(&self, text: &str) -> Option<AlertLevel> {
        let lower = text.to_lowercase();
        let vocab = &self.taxonomy.alerts;

        if contains_any(&lower, &vocab.critical_terms) {
            Some(AlertLevel::Critical)
        } else if contains_any(&lower, &vocab.high_terms) {
            Some(AlertLevel::High)
        } else if contains_any(&lower, &vocab.medium_terms) {
            Some(AlertLevel::Medium)
        } else if contains_any(&lower, &vocab.vulnerability)
            || contains_any(&lower, &vocab.performance)
            || contains_any(&lower, &vocab.critical_change)
        {
            Some(AlertLevel::Low)
        } else {
            None
        }
    }

    /// Derive an alert for one change, if it trips any heuristic.
    pub fn derive_alert(&self, text: &str) -> Option<AlertRecord> {
        let level = self.assess_level(text)?;

        let mut types = Vec::new();
        if self.is_vulnerability_related(text) {
            types.push(AlertType::Vulnerability);
        }
        if self.is_performance_related(text) {
            types.push(AlertType::Performance);
        }
        if self.is_critical_change(text) {
            types.push(AlertType::CriticalChange);
        }

        Some(AlertRecord {
            description: text.to_string(),
            level,
            types,
        })
    }

    /// Derive and roll up alerts for a release's change list, sorted by
    /// severity priority (critical first).
    pub fn summarize(&self, changes: &[String]) -> AlertSummary {
        let mut alerts: Vec<AlertRecord> = changes
            .iter()
            .filter_map(|c| self.derive_alert(c))
            .collect();
        alerts.sort_by_key(|a| a.level);

        let count_of = |level: AlertLevel| -> u64 {
            alerts.iter().filter(|a| a.level == level).count() as u64
        };

        AlertSummary {
            total_count: alerts.len() as u64,
            critical_count: count_of(AlertLevel::Critical),
            high_count: count_of(AlertLevel::High),
            medium_count: count_of(AlertLevel::Medium),
            low_count: count_of(AlertLevel::Low),
            alerts,
        }
    }
}

fn contains_any(lower_text: &str, vocabulary: &[String]) -> bool {
    vocabulary.iter().any(|word| lower_text.contains(word.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rce_is_critical_vulnerability() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        let alert = deriver
            .derive_alert("Remote code execution vulnerability in auth module")
            .unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
        assert!(alert.types.contains(&AlertType::Vulnerability));
    }

    #[test]
    fn test_breaking_change_is_high() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        let alert = deriver
            .derive_alert("Breaking change to the wire protocol")
            .unwrap();
        assert_eq!(alert.level, AlertLevel::High);
        assert!(alert.types.contains(&AlertType::CriticalChange));
    }

    #[test]
    fn test_optimization_is_medium() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        let alert = deriver
            .derive_alert("Query optimization for range scans")
            .unwrap();
        assert_eq!(alert.level, AlertLevel::Medium);
        assert!(alert.types.contains(&AlertType::Performance));
    }

    #[test]
    fn test_weak_signal_is_low() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        // "token" trips the vulnerability predicate but no severity tier
        // above the fallback.
        let alert = deriver.derive_alert("Rotate session token format").unwrap();
        assert_eq!(alert.level, AlertLevel::Low);
        assert!(alert.types.contains(&AlertType::Vulnerability));
    }

    #[test]
    fn test_no_signal_no_alert() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        assert!(deriver.derive_alert("Update the documentation wording").is_none());
    }

    #[test]
    fn test_ladder_is_exclusive() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        // Matches both critical ("crash") and medium ("performance")
        // vocabulary; the ladder must yield exactly the top tier.
        let alert = deriver
            .derive_alert("Fix crash caused by performance regression")
            .unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
    }

    #[test]
    fn test_summary_sorted_and_counted() {
        let taxonomy = Taxonomy::default();
        let deriver = AlertDeriver::new(&taxonomy);
        let changes = vec![
            "Query optimization for range scans".to_string(),
            "CVE-2024-0001 fixed in TLS handshake".to_string(),
            "Plain wording tweak".to_string(),
        ];
        let summary = deriver.summarize(&changes);
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.medium_count, 1);
        assert_eq!(summary.alerts[0].level, AlertLevel::Critical);
    }
}
