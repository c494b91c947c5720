//! Additive, rule-based product ranking against a behavior profile.
//!
//! | signal                | points        |
//! |-----------------------|---------------|
//! | category preferred    | 30            |
//! | price within budget   | 20            |
//! | shared tag            | 10 per tag    |
//! | viewed by id          | 25            |
//! | viewed keyword hit    | 5 per keyword |
//! | purchased             | 40            |
//!
//! Scores are never normalized or capped.

mod explanation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::behavior::UserBehaviorProfile;
use crate::domain::product::Product;

pub use explanation::{explain, explain_product, FALLBACK_REASON};

pub const CATEGORY_MATCH_POINTS: u32 = 30;
pub const PRICE_FIT_POINTS: u32 = 20;
pub const TAG_OVERLAP_POINTS: u32 = 10;
pub const VIEWED_ID_POINTS: u32 = 25;
pub const VIEWED_KEYWORD_POINTS: u32 = 5;
pub const PURCHASED_POINTS: u32 = 40;

pub const DEFAULT_TOP_N: usize = 3;

/// One rule that fired for a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum MatchedSignal {
    CategoryMatch { category: String },
    PriceFit { price: Decimal, max_price: Decimal },
    TagOverlap { shared: Vec<String> },
    ViewedById,
    ViewedKeyword { keyword: String },
    Purchased,
}

impl MatchedSignal {
    pub fn points(&self) -> u32 {
        match self {
            Self::CategoryMatch { .. } => CATEGORY_MATCH_POINTS,
            Self::PriceFit { .. } => PRICE_FIT_POINTS,
            Self::TagOverlap { shared } => TAG_OVERLAP_POINTS * shared.len() as u32,
            Self::ViewedById => VIEWED_ID_POINTS,
            Self::ViewedKeyword { .. } => VIEWED_KEYWORD_POINTS,
            Self::Purchased => PURCHASED_POINTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: u32,
    pub signals: Vec<MatchedSignal>,
}

/// Every signal `behavior` triggers for `product`, in table order.
pub fn signals_for(product: &Product, behavior: &UserBehaviorProfile) -> Vec<MatchedSignal> {
    let preferences = &behavior.preferences;
    let mut signals = Vec::new();

    if preferences.categories.contains(&product.category) {
        signals.push(MatchedSignal::CategoryMatch { category: product.category.clone() });
    }

    if let Some(max_price) = preferences.max_price {
        if product.price <= max_price {
            signals.push(MatchedSignal::PriceFit { price: product.price, max_price });
        }
    }

    let shared: Vec<String> = product
        .tags
        .iter()
        .filter(|tag| preferences.tags.contains(tag))
        .cloned()
        .collect();
    if !shared.is_empty() {
        signals.push(MatchedSignal::TagOverlap { shared });
    }

    if behavior.has_viewed(&product.id.0) {
        signals.push(MatchedSignal::ViewedById);
    }

    let title = product.title.to_lowercase();
    let description = product.description.to_lowercase();
    for keyword in behavior.viewed_keywords() {
        let needle = keyword.trim().to_lowercase();
        if !needle.is_empty() && (title.contains(&needle) || description.contains(&needle)) {
            signals.push(MatchedSignal::ViewedKeyword { keyword: keyword.to_string() });
        }
    }

    if behavior.has_purchased(&product.id.0) {
        signals.push(MatchedSignal::Purchased);
    }

    signals
}

pub fn score(product: &Product, behavior: &UserBehaviorProfile) -> ScoredProduct {
    let signals = signals_for(product, behavior);
    ScoredProduct {
        product: product.clone(),
        score: signals.iter().map(MatchedSignal::points).sum(),
        signals,
    }
}

/// Scores the whole catalog, highest first. Ties keep catalog order.
pub fn rank(catalog: &[Product], behavior: &UserBehaviorProfile) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> =
        catalog.iter().map(|product| score(product, behavior)).collect();
    scored.sort_by(|left, right| right.score.cmp(&left.score));
    scored
}

/// The first `top_n` entries of [`rank`].
pub fn score_and_rank(
    catalog: &[Product],
    behavior: &UserBehaviorProfile,
    top_n: usize,
) -> Vec<ScoredProduct> {
    let mut ranked = rank(catalog, behavior);
    ranked.truncate(top_n);
    ranked
}
