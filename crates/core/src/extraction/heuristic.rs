use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::category::infer_category;
use super::price::parse_price;
use super::{CandidateProduct, ExtractionStrategy, StrategyKind};
use crate::errors::ExternalServiceError;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 200;

// A currency-prefixed amount, or a bare number with exactly two decimals.
static PRICE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£][ \t]*\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?|\b\d+\.\d{2}\b")
        .expect("Invalid price token regex pattern")
});

/// Strategy C: last-resort line scan. A line carrying a price token becomes a
/// product titled by the rest of the line; the next line is its description.
#[derive(Clone, Debug, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Vec<CandidateProduct> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut candidates = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index];
            index += 1;

            let Some(token) = PRICE_TOKEN_RE.find(line) else {
                continue;
            };
            let Some(price) = parse_price(token.as_str()) else {
                continue;
            };

            let remainder = format!("{} {}", &line[..token.start()], &line[token.end()..]);
            let title = truncate_chars(&clean_title(&remainder), MAX_TITLE_CHARS);
            if title.is_empty() {
                continue;
            }

            let description = match lines.get(index) {
                Some(next) if !next.is_empty() && !PRICE_TOKEN_RE.is_match(next) => {
                    index += 1;
                    truncate_chars(next, MAX_DESCRIPTION_CHARS)
                }
                _ => String::new(),
            };

            let category = infer_category(&format!("{title} {description}")).to_string();
            candidates.push(CandidateProduct {
                title,
                category,
                price,
                description,
                tags: Vec::new(),
                source: StrategyKind::Heuristic,
            });
        }

        candidates
    }
}

#[async_trait]
impl ExtractionStrategy for HeuristicStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Heuristic
    }

    async fn try_extract(
        &self,
        text: &str,
    ) -> Result<Option<Vec<CandidateProduct>>, ExternalServiceError> {
        let candidates = self.extract(text);
        Ok((!candidates.is_empty()).then_some(candidates))
    }
}

/// Collapses whitespace and strips separator punctuation left around the
/// removed price token.
fn clean_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|ch: char| matches!(ch, '-' | '–' | '|' | ':' | ',' | '.' | '*' | '•'))
        .trim()
        .to_string()
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect::<String>().trim_end().to_string()
}
