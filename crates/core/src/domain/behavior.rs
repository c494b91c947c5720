use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

/// Caller-supplied personalization signals. Only ever logged as interaction
/// metadata, never stored on its own.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBehaviorProfile {
    #[serde(default, deserialize_with = "lenient_preferences")]
    pub preferences: Preferences,
    #[serde(default, deserialize_with = "entry_list")]
    pub viewed: Vec<BehaviorEntry>,
    #[serde(default, deserialize_with = "entry_list")]
    pub purchased: Vec<BehaviorEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, deserialize_with = "string_list")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "numeric_price")]
    pub max_price: Option<Decimal>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
}

/// A `viewed`/`purchased` item. Both shapes match product ids; only text
/// entries double as title keywords.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BehaviorEntry {
    Number(serde_json::Number),
    Text(String),
}

impl BehaviorEntry {
    pub fn matches_id(&self, id: &str) -> bool {
        match self {
            Self::Number(number) => number.to_string() == id,
            Self::Text(text) => text == id,
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

impl UserBehaviorProfile {
    /// Accepts any JSON object. Missing or oddly shaped sections count as
    /// empty; anything other than an object is rejected.
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::InvalidBehaviorProfile(
                "behavior must be a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value.clone())
            .map_err(|error| DomainError::InvalidBehaviorProfile(error.to_string()))
    }

    pub fn has_viewed(&self, id: &str) -> bool {
        self.viewed.iter().any(|entry| entry.matches_id(id))
    }

    pub fn has_purchased(&self, id: &str) -> bool {
        self.purchased.iter().any(|entry| entry.matches_id(id))
    }

    pub fn viewed_keywords(&self) -> impl Iterator<Item = &str> {
        self.viewed.iter().filter_map(BehaviorEntry::keyword)
    }
}

fn array_items<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// Non-object preferences are ignored.
fn lenient_preferences<'de, D>(deserializer: D) -> Result<Preferences, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(Preferences::default());
    }
    serde_json::from_value(value).map_err(serde::de::Error::custom)
}

fn entry_list<'de, D>(deserializer: D) -> Result<Vec<BehaviorEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(array_items(deserializer)?
        .into_iter()
        .filter_map(|value| match value {
            Value::String(text) => Some(BehaviorEntry::Text(text)),
            Value::Number(number) => Some(BehaviorEntry::Number(number)),
            _ => None,
        })
        .collect())
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(array_items(deserializer)?
        .into_iter()
        .filter_map(|value| match value {
            Value::String(text) => Some(text),
            _ => None,
        })
        .collect())
}

/// Budgets count only when given as a JSON number.
fn numeric_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => {
            let text = number.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{Preferences, UserBehaviorProfile};
    use crate::errors::DomainError;

    #[test]
    fn parses_camel_case_profile_with_numeric_ids() {
        let profile = UserBehaviorProfile::from_value(&json!({
            "preferences": {"categories": ["footwear"], "maxPrice": 100, "tags": ["running"]},
            "viewed": [1, "trail"],
            "purchased": ["p-9"]
        }))
        .expect("profile should parse");

        assert_eq!(profile.preferences.categories, vec!["footwear"]);
        assert_eq!(profile.preferences.max_price, Some(Decimal::new(100, 0)));
        assert!(profile.has_purchased("p-9"));
        assert!(profile.has_viewed("1"));
        assert!(profile.has_viewed("trail"));
        assert_eq!(profile.viewed_keywords().collect::<Vec<_>>(), vec!["trail"]);
    }

    #[test]
    fn empty_object_yields_empty_profile() {
        let profile = UserBehaviorProfile::from_value(&json!({})).expect("empty object is valid");
        assert_eq!(profile, UserBehaviorProfile::default());
    }

    #[test]
    fn non_object_profile_is_rejected() {
        let error = UserBehaviorProfile::from_value(&json!(["footwear"]))
            .expect_err("arrays are not behavior profiles");
        assert!(matches!(error, DomainError::InvalidBehaviorProfile(_)));
    }

    #[test]
    fn null_or_scalar_preferences_count_as_empty() {
        for preferences in [json!(null), json!("footwear"), json!(3)] {
            let profile = UserBehaviorProfile::from_value(&json!({ "preferences": preferences }))
                .expect("odd preferences are ignored");
            assert_eq!(profile.preferences, Preferences::default());
        }
    }

    #[test]
    fn non_array_lists_count_as_empty() {
        let profile = UserBehaviorProfile::from_value(&json!({
            "viewed": "shoe",
            "purchased": {"id": 4},
            "preferences": {"categories": "footwear", "tags": null}
        }))
        .expect("odd lists are ignored");

        assert!(profile.viewed.is_empty());
        assert!(profile.purchased.is_empty());
        assert!(profile.preferences.categories.is_empty());
        assert!(profile.preferences.tags.is_empty());
    }

    #[test]
    fn max_price_counts_only_as_a_number() {
        let text = UserBehaviorProfile::from_value(&json!({"preferences": {"maxPrice": "cheap"}}))
            .expect("string budget is ignored");
        assert_eq!(text.preferences.max_price, None);

        let quoted = UserBehaviorProfile::from_value(&json!({"preferences": {"maxPrice": "50"}}))
            .expect("quoted budget is ignored");
        assert_eq!(quoted.preferences.max_price, None);

        let fractional =
            UserBehaviorProfile::from_value(&json!({"preferences": {"maxPrice": 49.5}}))
                .expect("numeric budget");
        assert_eq!(fractional.preferences.max_price, Some(Decimal::new(495, 1)));
    }

    #[test]
    fn numeric_viewed_entries_are_ids_only() {
        let profile =
            UserBehaviorProfile::from_value(&json!({"viewed": [42, "boot"], "purchased": [7]}))
                .expect("profile should parse");

        assert!(profile.has_viewed("42"));
        assert!(profile.has_purchased("7"));
        assert_eq!(profile.viewed_keywords().collect::<Vec<_>>(), vec!["boot"]);
    }
}
