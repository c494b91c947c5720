use super::{MatchedSignal, ScoredProduct};

pub const FALLBACK_REASON: &str = "Recommended based on matching attributes.";

/// One `- Title: reason; reason` line restating the signals that fired.
pub fn explain_product(scored: &ScoredProduct) -> String {
    let mut reasons: Vec<String> = Vec::new();
    let mut keyword_hits = 0usize;

    for signal in &scored.signals {
        match signal {
            MatchedSignal::CategoryMatch { category } => {
                reasons.push(format!("category match: {category}"));
            }
            MatchedSignal::PriceFit { price, .. } => {
                reasons.push(format!("within budget: ${price}"));
            }
            MatchedSignal::TagOverlap { shared } => {
                reasons.push(format!("shared tags: {}", shared.len()));
            }
            MatchedSignal::ViewedById => reasons.push("recently viewed".to_string()),
            MatchedSignal::ViewedKeyword { .. } => keyword_hits += 1,
            MatchedSignal::Purchased => reasons.push("previously purchased".to_string()),
        }
    }
    if keyword_hits > 0 {
        reasons.push(format!("matches viewed keywords: {keyword_hits}"));
    }

    let body = if reasons.is_empty() { FALLBACK_REASON.to_string() } else { reasons.join("; ") };
    format!("- {}: {body}", scored.product.title)
}

/// Deterministic explanation for a ranked list, one line per product.
pub fn explain(ranked: &[ScoredProduct]) -> String {
    ranked.iter().map(explain_product).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{explain, explain_product};
    use crate::domain::behavior::UserBehaviorProfile;
    use crate::domain::product::{Product, ProductId};
    use crate::scoring::score;

    fn boot() -> Product {
        Product {
            id: ProductId("p-1".to_string()),
            title: "Hiking Boot".to_string(),
            description: "Waterproof leather".to_string(),
            category: "footwear".to_string(),
            price: Decimal::new(8900, 2),
            tags: vec!["hiking".to_string(), "leather".to_string()],
            stock: 3,
            sku: "FOO-1".to_string(),
            metadata: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn fired_signals_are_restated() {
        let profile = UserBehaviorProfile::from_value(&json!({
            "preferences": {"categories": ["footwear"], "maxPrice": 100, "tags": ["hiking"]},
            "viewed": ["p-1"],
            "purchased": ["p-1"]
        }))
        .expect("valid profile");

        let line = explain_product(&score(&boot(), &profile));

        assert_eq!(
            line,
            "- Hiking Boot: category match: footwear; within budget: $89.00; shared tags: 1; \
             recently viewed; previously purchased"
        );
    }

    #[test]
    fn products_without_signals_get_generic_reason() {
        let scored = score(&boot(), &UserBehaviorProfile::default());
        assert_eq!(explain(&[scored]), "- Hiking Boot: Recommended based on matching attributes.");
    }
}
