use pickwise_core::errors::{ApplicationError, BILLING_REMEDIATION};
use pickwise_core::extraction::{ExtractorChain, StrategyKind};
use pickwise_core::normalize::Normalizer;
use pickwise_db::repositories::ProductRepository;
use serde::Serialize;
use tracing::info;

use crate::error::persistence_error;

/// What one pass of text → products did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub strategy: Option<StrategyKind>,
    pub candidates: usize,
    pub dropped: usize,
    pub products_extracted: usize,
    pub duplicates_skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Extraction chain, then dedup and field derivation, then persistence. SKU
/// collisions with already stored products are skipped and counted.
pub async fn ingest_text(
    chain: &ExtractorChain,
    products: &dyn ProductRepository,
    text: &str,
    correlation_id: &str,
) -> Result<IngestReport, ApplicationError> {
    let outcome = chain.extract(text).await;
    let notice = outcome.billing_failure().map(|_| {
        format!("LLM extraction unavailable (billing); used fallback parsing. {BILLING_REMEDIATION}")
    });
    let candidates = outcome.candidates.len();

    let drafts = Normalizer::new().normalize(outcome.candidates);
    let summary = products.insert_drafts(drafts).await.map_err(persistence_error)?;

    info!(
        event_name = "catalog.ingested",
        correlation_id,
        strategy = outcome.strategy.map_or("none", |kind| kind.as_str()),
        candidates,
        inserted = summary.inserted.len(),
        duplicates = summary.skipped_duplicates.len(),
        "catalog text ingested"
    );

    Ok(IngestReport {
        strategy: outcome.strategy,
        candidates,
        dropped: outcome.dropped,
        products_extracted: summary.inserted.len(),
        duplicates_skipped: summary.skipped_duplicates.len(),
        notice,
    })
}
