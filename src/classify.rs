//! Classification engine: weighted keyword scoring over a fixed taxonomy.
//!
//! Each change description gets exactly one primary category: the category
//! with the strictly highest count of distinct whole-word keyword matches.
//! Ties on a nonzero score are broken by category declaration order
//! (first-declared wins), which makes classification deterministic and
//! independent of any map iteration order. A text matching no keyword at
//! all is `other`.
//!
//! Scores are raw counts with no normalization by text length or keyword
//! rarity; downstream aggregates assume these semantics.

use std::collections::BTreeMap;

use crate::models::{AnalysisSummary, Category, ClassifiedChange, ReleaseRecord};
use crate::taxonomy::Taxonomy;

pub struct Classifier<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> Classifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Classifier { taxonomy }
    }

    /// Assign the primary category for one change description.
    ///
    /// Total and deterministic: always returns a category, same input
    /// always yields the same output.
    pub fn classify(&self, text: &str) -> Category {
        let mut best: Option<(Category, usize)> = None;
        for rules in self.taxonomy.categories() {
            let score = rules.score(text);
            if score == 0 {
                continue;
            }
            // Strictly-greater keeps the first-declared category on ties.
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((rules.category, score)),
            }
        }
        best.map(|(c, _)| c).unwrap_or(Category::Other)
    }

    /// Classify every change of a release and tally per-category counts.
    /// The tally contains all categories, zeroes included, and the dominant
    /// category uses the same declaration-order tie-break as `classify`.
    pub fn analyze_patch(&self, record: &ReleaseRecord) -> AnalysisSummary {
        let mut summary: BTreeMap<Category, u64> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        let mut details = Vec::with_capacity(record.changes.len());

        for change in &record.changes {
            let category = self.classify(change);
            *summary.entry(category).or_insert(0) += 1;
            details.push(ClassifiedChange {
                description: change.clone(),
                category,
            });
        }

        let dominant_type = dominant_category(&summary);

        AnalysisSummary {
            dominant_type,
            summary,
            details,
        }
    }
}

/// The category with the maximum count; ties broken by declaration order.
/// An all-zero tally is dominated by the first-declared category, matching
/// the tie-break rule applied to equal scores.
fn dominant_category(summary: &BTreeMap<Category, u64>) -> Category {
    let mut best = Category::ALL[0];
    let mut best_count = summary.get(&best).copied().unwrap_or(0);
    for category in Category::ALL.iter().skip(1) {
        let count = summary.get(category).copied().unwrap_or(0);
        if count > best_count {
            best = *category;
            best_count = count;
        }
    }
    best
}
