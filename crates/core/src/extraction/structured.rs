//! Parsing of model-produced product lists.
//!
//! The model is asked for a JSON array of flat product objects. Replies are
//! routinely wrapped in code fences or preceded by prose, so parsing strips
//! both before handing the payload to `serde_json`.

use rust_decimal::Decimal;
use serde_json::Value;

use super::record::RawRecord;
use super::{CandidateProduct, StrategyKind};
use crate::errors::ExternalServiceError;

/// Characters of document text submitted to the model.
pub const MODEL_CONTEXT_LIMIT: usize = 8000;
/// Upper bound on records accepted from one model reply.
pub const MAX_MODEL_RECORDS: usize = 50;

/// Returns at most `limit` characters of `text`, cut on a char boundary.
pub fn truncate_context(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn parse_model_output(raw: &str) -> Result<Vec<CandidateProduct>, ExternalServiceError> {
    let payload = strip_formatting(raw);
    if payload.is_empty() {
        return Err(ExternalServiceError::MalformedResponse("empty model reply".to_string()));
    }

    let value: Value = serde_json::from_str(payload).map_err(|error| {
        ExternalServiceError::MalformedResponse(format!("model reply is not JSON: {error}"))
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("products") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(object)],
        },
        other => {
            return Err(ExternalServiceError::MalformedResponse(format!(
                "expected a list of products, got {}",
                json_kind(&other)
            )))
        }
    };

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .map(RawRecord::from_json)
        .filter(|record| record.price.is_some_and(|price| price > Decimal::ZERO))
        .filter_map(|record| record.into_candidate(StrategyKind::Model))
        .take(MAX_MODEL_RECORDS)
        .collect())
}

/// Drops code fences and any prose before the first `[`/`{` or after the
/// matching last `]`/`}`.
fn strip_formatting(raw: &str) -> &str {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let Some(start) = trimmed.find(['[', '{']) else {
        return "";
    };
    let closing = if trimmed[start..].starts_with('[') { ']' } else { '}' };
    match trimmed.rfind(closing) {
        Some(end) if end > start => &trimmed[start..=end],
        _ => "",
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
