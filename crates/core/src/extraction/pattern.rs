use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::price::parse_price;
use super::record::{split_tags, RawRecord};
use super::{CandidateProduct, ExtractionStrategy, StrategyKind};
use crate::errors::ExternalServiceError;

// `Title - category - $price [- description]`, one record per line.
static DELIMITED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?P<title>[^\n|]+)[ \t]+[-|–][ \t]+(?P<category>[^\n|]+?)[ \t]+[-|–][ \t]+[$€£]?[ \t]*(?P<price>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?:[ \t]+[-|–][ \t]+(?P<description>[^\n]*?))?[ \t]*$",
    )
    .expect("Invalid delimited record regex pattern")
});

static LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(title|name|product|category|price|description|desc|tags)\s*[:=]\s*(.*?)\s*$")
        .expect("Invalid labeled field regex pattern")
});

static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("Invalid JSON fragment regex pattern"));

/// The record shapes recognised in catalog text, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordPattern {
    Delimited,
    Labeled,
    Csv,
    JsonFragment,
}

impl RecordPattern {
    pub const ALL: [RecordPattern; 4] =
        [Self::Delimited, Self::Labeled, Self::Csv, Self::JsonFragment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delimited => "delimited",
            Self::Labeled => "labeled",
            Self::Csv => "csv",
            Self::JsonFragment => "json_fragment",
        }
    }

    pub fn apply(&self, text: &str) -> Vec<CandidateProduct> {
        match self {
            Self::Delimited => delimited_records(text),
            Self::Labeled => labeled_records(text),
            Self::Csv => csv_records(text),
            Self::JsonFragment => json_fragment_records(text),
        }
    }
}

/// Strategy A: structural patterns over the full text. The first pattern
/// with at least one match wins.
#[derive(Clone, Debug, Default)]
pub struct PatternStrategy;

impl PatternStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Option<(RecordPattern, Vec<CandidateProduct>)> {
        let text = text.replace('\r', "");
        RecordPattern::ALL.iter().find_map(|pattern| {
            let records = pattern.apply(&text);
            (!records.is_empty()).then_some((*pattern, records))
        })
    }
}

#[async_trait]
impl ExtractionStrategy for PatternStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pattern
    }

    async fn try_extract(
        &self,
        text: &str,
    ) -> Result<Option<Vec<CandidateProduct>>, ExternalServiceError> {
        Ok(self.extract(text).map(|(pattern, records)| {
            debug!(
                event_name = "extraction.pattern.matched",
                pattern = pattern.as_str(),
                records = records.len(),
                "record pattern matched"
            );
            records
        }))
    }
}

fn delimited_records(text: &str) -> Vec<CandidateProduct> {
    DELIMITED_RE
        .captures_iter(text)
        .filter_map(|captures| {
            let price = parse_price(captures.name("price")?.as_str())?;
            Some(CandidateProduct {
                title: captures.name("title")?.as_str().trim().to_string(),
                category: captures.name("category")?.as_str().trim().to_string(),
                price,
                description: captures
                    .name("description")
                    .map(|value| value.as_str().trim().to_string())
                    .unwrap_or_default(),
                tags: Vec::new(),
                source: StrategyKind::Pattern,
            })
        })
        .collect()
}

fn labeled_records(text: &str) -> Vec<CandidateProduct> {
    let mut records = Vec::new();
    let mut current = RawRecord::default();

    let mut flush = |record: &mut RawRecord| {
        if let Some(candidate) = std::mem::take(record).into_candidate(StrategyKind::Pattern) {
            records.push(candidate);
        }
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current);
            continue;
        }

        let Some(captures) = LABELED_RE.captures(line) else {
            continue;
        };
        let value = captures.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();

        match captures[1].to_ascii_lowercase().as_str() {
            "title" | "name" | "product" => {
                if current.has_title() {
                    flush(&mut current);
                }
                current.title = Some(value);
            }
            "category" => current.category = Some(value),
            "price" => current.price = parse_price(&value),
            "description" | "desc" => current.description = Some(value),
            "tags" => current.tags = split_tags(&value),
            _ => {}
        }
    }
    flush(&mut current);

    records
}

#[derive(Debug, Default)]
struct CsvColumns {
    title: usize,
    price: usize,
    category: Option<usize>,
    description: Option<usize>,
    tags: Option<usize>,
}

impl CsvColumns {
    fn from_header(fields: &[String]) -> Option<Self> {
        let position = |names: &[&str]| {
            fields.iter().position(|field| names.contains(&field.to_lowercase().trim()))
        };

        Some(Self {
            title: position(&["title", "name", "product", "product name"])?,
            price: position(&["price", "cost", "unit price"])?,
            category: position(&["category", "type"]),
            description: position(&["description", "desc", "details"]),
            tags: position(&["tags", "keywords"]),
        })
    }
}

fn csv_records(text: &str) -> Vec<CandidateProduct> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let Some(columns) = lines.by_ref().find_map(|line| {
        if !line.contains(',') {
            return None;
        }
        CsvColumns::from_header(&split_csv_line(line))
    }) else {
        return Vec::new();
    };

    lines
        .filter(|line| line.contains(','))
        .filter_map(|line| {
            let fields = split_csv_line(line);
            let field = |index: Option<usize>| {
                index.and_then(|index| fields.get(index)).map(|value| value.trim().to_string())
            };

            RawRecord {
                title: field(Some(columns.title)),
                category: field(columns.category),
                price: field(Some(columns.price)).and_then(|value| parse_price(&value)),
                description: field(columns.description),
                tags: field(columns.tags).map(|value| split_tags(&value)).unwrap_or_default(),
            }
            .into_candidate(StrategyKind::Pattern)
        })
        .collect()
}

/// Splits one CSV row, honouring double-quoted fields and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            other => field.push(other),
        }
    }
    fields.push(field);

    fields.into_iter().map(|value| value.trim().to_string()).collect()
}

fn json_fragment_records(text: &str) -> Vec<CandidateProduct> {
    JSON_OBJECT_RE
        .find_iter(text)
        .filter_map(|fragment| serde_json::from_str::<Value>(fragment.as_str()).ok())
        .filter_map(|value| {
            value
                .as_object()
                .map(RawRecord::from_json)
                .and_then(|record| record.into_candidate(StrategyKind::Pattern))
        })
        .collect()
}
