use std::str::FromStr;

use rust_decimal::Decimal;

/// Parses a human-written price such as `$1,299.00`, `€ 15` or `79.99`.
/// Returns `None` for anything that is not a non-negative amount.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(|ch: char| matches!(ch, '$' | '€' | '£') || ch.is_whitespace())
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let price = Decimal::from_str(&cleaned).ok()?;
    (!price.is_sign_negative()).then_some(price)
}
