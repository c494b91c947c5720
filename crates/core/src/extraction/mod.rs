//! Product extraction from raw catalog text.
//!
//! Extraction is an ordered chain of strategies behind one trait. The chain
//! stops at the first strategy that yields at least one valid candidate:
//!
//! 1. [`PatternStrategy`] - structured line/record patterns
//! 2. a model-backed strategy supplied by the caller (optional)
//! 3. [`HeuristicStrategy`] - price-token line scanning
//!
//! An empty outcome is a valid result ("no products found"), never an error.

mod category;
mod heuristic;
mod pattern;
mod price;
mod record;
pub mod structured;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ExternalServiceError;

pub use category::{infer_category, DEFAULT_CATEGORY};
pub use heuristic::HeuristicStrategy;
pub use pattern::{PatternStrategy, RecordPattern};
pub use price::parse_price;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Pattern,
    Model,
    Heuristic,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Model => "model",
            Self::Heuristic => "heuristic",
        }
    }
}

/// An unvalidated, unpersisted product record produced by one strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateProduct {
    pub title: String,
    pub category: String,
    pub price: Decimal,
    pub description: String,
    pub tags: Vec<String>,
    pub source: StrategyKind,
}

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// `Ok(None)` and `Ok(Some(vec![]))` both mean "nothing found here".
    async fn try_extract(
        &self,
        text: &str,
    ) -> Result<Option<Vec<CandidateProduct>>, ExternalServiceError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    pub error: ExternalServiceError,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractionOutcome {
    pub candidates: Vec<CandidateProduct>,
    /// Strategy that produced `candidates`; `None` when nothing was found.
    pub strategy: Option<StrategyKind>,
    pub attempted: Vec<StrategyKind>,
    pub failures: Vec<StrategyFailure>,
    /// Records dropped by validation across all attempted strategies.
    pub dropped: usize,
}

impl ExtractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn billing_failure(&self) -> Option<&ExternalServiceError> {
        self.failures.iter().map(|failure| &failure.error).find(|error| error.is_billing())
    }
}

pub struct ExtractorChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ExtractorChain {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Pattern matching followed by the heuristic scan; no external calls.
    pub fn deterministic() -> Self {
        Self::new(vec![Box::new(PatternStrategy::new()), Box::new(HeuristicStrategy::new())])
    }

    /// The full three-stage chain with `model` between pattern and heuristic.
    pub fn with_model(model: Box<dyn ExtractionStrategy>) -> Self {
        Self::new(vec![
            Box::new(PatternStrategy::new()),
            model,
            Box::new(HeuristicStrategy::new()),
        ])
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|strategy| strategy.kind()).collect()
    }

    pub async fn extract(&self, text: &str) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::default();

        for strategy in &self.strategies {
            let kind = strategy.kind();
            outcome.attempted.push(kind);

            let raw = match strategy.try_extract(text).await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    debug!(
                        event_name = "extraction.strategy.empty",
                        strategy = kind.as_str(),
                        "strategy found no candidates"
                    );
                    continue;
                }
                Err(error) => {
                    warn!(
                        event_name = "extraction.strategy.failed",
                        strategy = kind.as_str(),
                        error = %error,
                        "strategy failed, falling through"
                    );
                    outcome.failures.push(StrategyFailure { strategy: kind, error });
                    continue;
                }
            };

            let total = raw.len();
            let accepted: Vec<CandidateProduct> = raw.into_iter().filter_map(validate).collect();
            outcome.dropped += total - accepted.len();

            if !accepted.is_empty() {
                info!(
                    event_name = "extraction.strategy.matched",
                    strategy = kind.as_str(),
                    candidates = accepted.len(),
                    dropped = outcome.dropped,
                    "strategy produced candidates"
                );
                outcome.candidates = accepted;
                outcome.strategy = Some(kind);
                return outcome;
            }
        }

        info!(
            event_name = "extraction.empty",
            attempted = outcome.attempted.len(),
            failures = outcome.failures.len(),
            "no products found in document text"
        );
        outcome
    }
}

/// Shared validation applied to every strategy's output: a title is required
/// and the price must be non-negative. Text fields are trimmed and the
/// category is lowercased.
fn validate(mut candidate: CandidateProduct) -> Option<CandidateProduct> {
    candidate.title = candidate.title.trim().to_string();
    if candidate.title.is_empty() || candidate.price.is_sign_negative() {
        return None;
    }

    candidate.description = candidate.description.trim().to_string();
    candidate.category = candidate.category.trim().to_lowercase();
    if candidate.category.is_empty() {
        candidate.category = DEFAULT_CATEGORY.to_string();
    }
    Some(candidate)
}
