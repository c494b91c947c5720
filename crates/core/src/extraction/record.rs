use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::category::infer_category;
use super::price::parse_price;
use super::{CandidateProduct, StrategyKind};

/// Loosely-typed product fields gathered by the record-oriented patterns and
/// by model output parsing before they become a [`CandidateProduct`].
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RawRecord {
    pub title: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl RawRecord {
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| object.get(*key))
                .find_map(|value| value.as_str().map(str::trim).filter(|s| !s.is_empty()))
                .map(str::to_string)
        };

        let price = ["price", "cost"]
            .iter()
            .filter_map(|key| object.get(*key))
            .find_map(json_price);

        let tags = match object.get("tags") {
            Some(Value::Array(items)) => {
                items.iter().filter_map(Value::as_str).map(str::to_string).collect()
            }
            Some(Value::String(joined)) => split_tags(joined),
            _ => Vec::new(),
        };

        Self {
            title: text(&["title", "name", "product"]),
            category: text(&["category"]),
            price,
            description: text(&["description", "desc"]),
            tags,
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|title| !title.trim().is_empty())
    }

    pub fn into_candidate(self, source: StrategyKind) -> Option<CandidateProduct> {
        let title = self.title.filter(|title| !title.trim().is_empty())?;
        let price = self.price?;
        let description = self.description.unwrap_or_default();
        let category = self
            .category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| infer_category(&format!("{title} {description}")).to_string());

        Some(CandidateProduct { title, category, price, description, tags: self.tags, source })
    }
}

fn json_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Some(Decimal::from(integer))
            } else {
                number.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(text) => parse_price(text),
        _ => None,
    }
}

pub(crate) fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
