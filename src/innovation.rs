//! Innovation tagging: multi-label detection of emerging-technology themes.
//!
//! Unlike the single-label classifier, a change may carry several themes at
//! once. A theme is reported only with enough evidence: at least two
//! matched keywords, or a single matched keyword longer than three
//! characters. The asymmetric threshold keeps short, high-collision
//! keywords (`gc`, `ann`, `ai`) from tagging on their own while letting
//! one long, specific term qualify.

use std::collections::BTreeMap;

use crate::models::{
    ClassifiedChange, InnovationSummary, InnovationTag, InnovationTrends, Theme, TrendEntry,
};
use crate::taxonomy::Taxonomy;

/// Share (percent) above which a theme counts as established.
const ESTABLISHED_SHARE: f64 = 20.0;
/// Share (percent) above which a theme counts as emerging.
const EMERGING_SHARE: f64 = 5.0;
/// How many multi-theme changes the summary surfaces.
const TOP_INNOVATIONS: usize = 10;

pub struct InnovationTagger<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> InnovationTagger<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        InnovationTagger { taxonomy }
    }

    /// Themes with sufficient keyword evidence in `text`. May be empty.
    pub fn detect_themes(&self, text: &str) -> Vec<Theme> {
        let lower = text.to_lowercase();
        let mut detected = Vec::new();

        for rules in self.taxonomy.themes() {
            let matched = rules.matches(&lower);
            let qualifies = matched.len() >= 2
                || (!matched.is_empty() && matched.iter().any(|k| k.len() > 3));
            if qualifies {
                detected.push(rules.theme);
            }
        }

        detected
    }

    /// Full per-release innovation rollup: counts, details, trend split,
    /// and the top multi-theme changes. Takes the already-classified
    /// changes so each detail entry carries its primary category.
    pub fn summarize(&self, details: &[ClassifiedChange]) -> InnovationSummary {
        let mut tags = Vec::new();
        let mut category_counts: BTreeMap<Theme, u64> = BTreeMap::new();
        let mut category_details: BTreeMap<Theme, Vec<ClassifiedChange>> = BTreeMap::new();

        for detail in details {
            let themes = self.detect_themes(&detail.description);
            if themes.is_empty() {
                continue;
            }
            for theme in &themes {
                *category_counts.entry(*theme).or_insert(0) += 1;
                category_details
                    .entry(*theme)
                    .or_default()
                    .push(detail.clone());
            }
            tags.push(InnovationTag {
                description: detail.description.clone(),
                categories: themes,
            });
        }

        let innovation_trends = analyze_trends(&tags, &category_counts);
        let top_innovations = top_innovations(&tags);

        InnovationSummary {
            total_innovations: tags.len() as u64,
            categories_detected: category_counts.keys().copied().collect(),
            category_counts,
            category_details,
            innovation_trends,
            top_innovations,
        }
    }
}

fn analyze_trends(
    tags: &[InnovationTag],
    category_counts: &BTreeMap<Theme, u64>,
) -> InnovationTrends {
    let total = tags.len() as f64;
    let mut established = Vec::new();
    let mut emerging = Vec::new();

    if total > 0.0 {
        for (theme, count) in category_counts {
            let percentage = (*count as f64 / total) * 100.0;
            let entry = TrendEntry {
                category: *theme,
                count: *count,
                percentage: (percentage * 100.0).round() / 100.0,
            };
            if percentage > ESTABLISHED_SHARE {
                established.push(entry);
            } else if percentage > EMERGING_SHARE {
                emerging.push(entry);
            }
        }
    }

    InnovationTrends {
        established_trends: established,
        emerging_trends: emerging,
        category_frequency: category_counts.clone(),
    }
}

/// Trend split over rolled-up theme tallies, for product and store level
/// views where the individual tagged changes are no longer at hand. The
/// share denominator is the total number of theme hits at that level.
pub fn trends_from_counts(category_counts: &BTreeMap<Theme, u64>) -> InnovationTrends {
    let total: u64 = category_counts.values().sum();
    let mut established = Vec::new();
    let mut emerging = Vec::new();

    if total > 0 {
        for (theme, count) in category_counts {
            let percentage = (*count as f64 / total as f64) * 100.0;
            let entry = TrendEntry {
                category: *theme,
                count: *count,
                percentage: (percentage * 100.0).round() / 100.0,
            };
            if percentage > ESTABLISHED_SHARE {
                established.push(entry);
            } else if percentage > EMERGING_SHARE {
                emerging.push(entry);
            }
        }
    }

    InnovationTrends {
        established_trends: established,
        emerging_trends: emerging,
        category_frequency: category_counts.clone(),
    }
}

/// Changes carrying the most themes first, capped to a short list.
fn top_innovations(tags: &[InnovationTag]) -> Vec<InnovationTag> {
    let mut sorted: Vec<InnovationTag> = tags.to_vec();
    sorted.sort_by(|a, b| b.categories.len().cmp(&a.categories.len()));
    sorted.truncate(TOP_INNOVATIONS);
    sorted
}
