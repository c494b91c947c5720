//! Fuzzy deduplication of extracted candidates and derivation of the fields
//! a stored product needs (tags, synthetic SKU).
//!
//! Every accepted title is compared against every later candidate, so the
//! cost is quadratic in catalog size times title length. That is fine for
//! the tens to low hundreds of products a single catalog upload yields and
//! is not meant to scale past that.

mod similarity;
mod sku;
mod tags;

use serde_json::json;
use tracing::debug;

use crate::domain::product::ProductDraft;
use crate::extraction::CandidateProduct;

pub use similarity::{normalize_title, similarity};
pub use sku::synthesize_sku;
pub use tags::{derive_tags, MAX_TAGS};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalizer {
    threshold: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { threshold: DEFAULT_SIMILARITY_THRESHOLD }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles whose similarity strictly exceeds `threshold` are duplicates.
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold: threshold.clamp(0.0, 1.0) }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_duplicate(&self, normalized: &str, accepted: &[String]) -> bool {
        accepted
            .iter()
            .any(|seen| seen == normalized || similarity(seen, normalized) > self.threshold)
    }

    /// Keeps the first of every group of near-identical titles, in input order.
    pub fn deduplicate(&self, candidates: Vec<CandidateProduct>) -> Vec<CandidateProduct> {
        let total = candidates.len();
        let mut accepted_titles: Vec<String> = Vec::with_capacity(total);
        let mut accepted = Vec::with_capacity(total);

        for candidate in candidates {
            let normalized = normalize_title(&candidate.title);
            if self.is_duplicate(&normalized, &accepted_titles) {
                debug!(
                    event_name = "normalize.duplicate_dropped",
                    title = %candidate.title,
                    "candidate dropped as duplicate"
                );
                continue;
            }
            accepted_titles.push(normalized);
            accepted.push(candidate);
        }

        debug!(
            event_name = "normalize.deduplicated",
            input = total,
            output = accepted.len(),
            "candidates deduplicated"
        );
        accepted
    }

    /// Deduplicates, then derives tags and a synthetic SKU for each survivor.
    pub fn normalize(&self, candidates: Vec<CandidateProduct>) -> Vec<ProductDraft> {
        self.deduplicate(candidates).into_iter().map(into_draft).collect()
    }
}

fn into_draft(candidate: CandidateProduct) -> ProductDraft {
    let tags = derive_tags(&candidate.tags, &candidate.description, &candidate.category);
    let sku = synthesize_sku(&candidate.category, &normalize_title(&candidate.title));

    ProductDraft {
        title: candidate.title,
        description: candidate.description,
        category: candidate.category,
        price: candidate.price,
        tags,
        sku,
        stock: 0,
        metadata: json!({ "source": candidate.source.as_str() }),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{normalize_title, similarity, Normalizer};
    use crate::extraction::{CandidateProduct, StrategyKind};

    fn candidate(title: &str) -> CandidateProduct {
        CandidateProduct {
            title: title.to_string(),
            category: "footwear".to_string(),
            price: Decimal::new(7999, 2),
            description: "Lightweight trainer".to_string(),
            tags: Vec::new(),
            source: StrategyKind::Pattern,
        }
    }

    fn titles(candidates: &[CandidateProduct]) -> Vec<&str> {
        candidates.iter().map(|candidate| candidate.title.as_str()).collect()
    }

    #[test]
    fn near_identical_titles_keep_first_seen() {
        let deduped = Normalizer::new().deduplicate(vec![
            candidate("Running Shoe"),
            candidate("Running Shoes"),
            candidate("Trail Boot"),
        ]);

        assert_eq!(titles(&deduped), vec!["Running Shoe", "Trail Boot"]);
    }

    #[test]
    fn exact_matches_ignore_case_and_spacing() {
        let deduped =
            Normalizer::new().deduplicate(vec![candidate("Desk  Lamp"), candidate(" desk lamp ")]);

        assert_eq!(titles(&deduped), vec!["Desk  Lamp"]);
    }

    #[test]
    fn deduplication_is_idempotent() {
        let normalizer = Normalizer::new();
        let input = vec![
            candidate("Yoga Mat"),
            candidate("Yoga Mats"),
            candidate("Water Bottle"),
            candidate("Water Bottles"),
            candidate("Camera Strap"),
        ];

        let once = normalizer.deduplicate(input);
        let twice = normalizer.deduplicate(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn survivors_are_pairwise_below_threshold() {
        let normalizer = Normalizer::new();
        let deduped = normalizer.deduplicate(vec![
            candidate("Wireless Mouse"),
            candidate("Wireless Mouse 2"),
            candidate("Wired Mouse"),
            candidate("Wireless Mice"),
        ]);

        for (index, left) in deduped.iter().enumerate() {
            for right in &deduped[index + 1..] {
                let score =
                    similarity(&normalize_title(&left.title), &normalize_title(&right.title));
                assert!(score <= normalizer.threshold(), "{} vs {}", left.title, right.title);
            }
        }
    }

    #[test]
    fn normalize_derives_tags_and_sku() {
        let drafts = Normalizer::new().normalize(vec![candidate("Running Shoe")]);

        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].sku.starts_with("FOO-"));
        assert_eq!(drafts[0].tags, vec!["lightweight", "trainer", "footwear"]);
        assert_eq!(drafts[0].metadata["source"], "pattern");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(Normalizer::new().normalize(Vec::new()).is_empty());
    }
}
