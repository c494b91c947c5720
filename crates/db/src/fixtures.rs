use pickwise_core::extraction::{ExtractorChain, StrategyKind};
use pickwise_core::normalize::Normalizer;
use tracing::info;

use crate::repositories::{ProductRepository, RepositoryError};

/// Titles the demo catalog text must yield, in catalog order.
pub const DEMO_TITLES: &[&str] = &[
    "Trail Running Shoe",
    "Road Running Shoe",
    "Noise Cancelling Headphones",
    "Waterproof Hiking Jacket",
    "Ceramic Coffee Mug",
    "Yoga Mat",
    "Leather Wallet",
    "Field Guide to Birds",
];

/// Deterministic demo catalog. Seeding runs the text through the same
/// deterministic extraction chain and normalizer an upload would, so the
/// SKUs are stable and reloading skips what is already present.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const TEXT: &str = include_str!("../../../config/fixtures/demo_catalog.txt");

    pub async fn load(repo: &dyn ProductRepository) -> Result<SeedResult, RepositoryError> {
        let outcome = ExtractorChain::deterministic().extract(Self::TEXT).await;
        let strategy = outcome.strategy.ok_or_else(|| {
            RepositoryError::Decode("demo catalog text yielded no products".to_string())
        })?;
        let drafts = Normalizer::new().normalize(outcome.candidates);
        let extracted = drafts.len();

        let summary = repo.insert_drafts(drafts).await?;
        info!(
            event_name = "fixtures.demo_catalog.loaded",
            strategy = strategy.as_str(),
            extracted,
            inserted = summary.inserted.len(),
            skipped = summary.skipped_duplicates.len(),
            "demo catalog seeded"
        );

        Ok(SeedResult {
            strategy,
            extracted,
            inserted: summary.inserted.len(),
            already_present: summary.skipped_duplicates.len(),
        })
    }

    /// Checks that every demo product is stored under its synthesized SKU.
    pub async fn verify(repo: &dyn ProductRepository) -> Result<VerificationResult, RepositoryError> {
        let outcome = ExtractorChain::deterministic().extract(Self::TEXT).await;
        let drafts = Normalizer::new().normalize(outcome.candidates);

        let mut checks = Vec::with_capacity(DEMO_TITLES.len());
        for title in DEMO_TITLES {
            let stored = match drafts.iter().find(|draft| draft.title == *title) {
                Some(draft) => repo
                    .find_by_sku(&draft.sku)
                    .await?
                    .is_some_and(|product| product.title == draft.title),
                None => false,
            };
            checks.push((*title, stored));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub strategy: StrategyKind,
    pub extracted: usize,
    pub inserted: usize,
    pub already_present: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryProductRepository, SqlProductRepository};
    use crate::{connect_with_settings, migrations};

    #[test]
    fn demo_catalog_text_is_embedded() {
        assert!(DemoCatalog::TEXT.contains("Trail Running Shoe"));
    }

    #[tokio::test]
    async fn demo_catalog_yields_expected_titles_via_pattern_strategy() {
        let outcome = ExtractorChain::deterministic().extract(DemoCatalog::TEXT).await;

        assert_eq!(outcome.strategy, Some(StrategyKind::Pattern));
        let titles: Vec<_> = outcome.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, DEMO_TITLES);
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        let repo = SqlProductRepository::new(pool);

        let first = DemoCatalog::load(&repo).await.expect("load seed fixtures");
        let first_verification = DemoCatalog::verify(&repo).await.expect("verify seed");
        assert!(first_verification.all_present);
        assert_eq!(first.inserted, DEMO_TITLES.len());
        assert_eq!(first.already_present, 0);

        let second = DemoCatalog::load(&repo).await.expect("reload seed fixtures");
        let second_verification = DemoCatalog::verify(&repo).await.expect("re-verify seed");
        assert!(second_verification.all_present);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.already_present, DEMO_TITLES.len());
        assert_eq!(first_verification.checks, second_verification.checks);
        assert_eq!(repo.count().await.expect("count"), DEMO_TITLES.len() as u64);
    }

    #[tokio::test]
    async fn verification_fails_on_empty_store() {
        let repo = InMemoryProductRepository::default();

        let verification = DemoCatalog::verify(&repo).await.expect("verify");

        assert!(!verification.all_present);
        assert_eq!(verification.checks.len(), DEMO_TITLES.len());
    }
}
