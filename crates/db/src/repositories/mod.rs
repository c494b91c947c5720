use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use pickwise_core::domain::interaction::{InteractionType, UserInteraction};
use pickwise_core::domain::product::{Product, ProductDraft, ProductId};
use pickwise_core::domain::upload::CatalogUpload;

pub mod interaction;
pub mod memory;
pub mod product;
mod rows;
pub mod upload;

pub use interaction::SqlInteractionRepository;
pub use memory::{
    InMemoryCatalogUploadRepository, InMemoryInteractionRepository, InMemoryProductRepository,
};
pub use product::SqlProductRepository;
pub use upload::SqlCatalogUploadRepository;

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 500;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("product with SKU `{0}` already exists")]
    DuplicateSku(String),
}

impl RepositoryError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateSku(_))
    }
}

/// Clamps a caller-supplied limit into `1..=MAX_LIST_LIMIT`.
pub fn effective_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// `limit: None` returns the whole catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

impl ProductFilter {
    pub fn all() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionFilter {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub interaction_type: Option<InteractionType>,
    pub limit: Option<u32>,
}

/// Result of persisting a normalized batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: Vec<ProductId>,
    pub skipped_duplicates: Vec<String>,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError>;

    /// Fails with `DuplicateSku` when the SKU is taken; SKUs are never rewritten.
    async fn insert(&self, product: Product) -> Result<(), RepositoryError>;

    /// Products in catalog order (oldest first).
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// Persists drafts one by one; a taken SKU skips that draft and the batch
    /// continues.
    async fn insert_drafts(
        &self,
        drafts: Vec<ProductDraft>,
    ) -> Result<InsertSummary, RepositoryError> {
        let mut summary = InsertSummary::default();
        for draft in drafts {
            let id = ProductId::generate();
            let sku = draft.sku.clone();
            match self.insert(draft.into_product(id.clone(), chrono::Utc::now())).await {
                Ok(()) => summary.inserted.push(id),
                Err(RepositoryError::DuplicateSku(sku)) => {
                    debug!(event_name = "catalog.persist.duplicate_sku", sku = %sku, "sku taken");
                    summary.skipped_duplicates.push(sku);
                }
                Err(error) => {
                    debug!(event_name = "catalog.persist.failed", sku = %sku, error = %error);
                    return Err(error);
                }
            }
        }
        Ok(summary)
    }
}

#[async_trait]
pub trait CatalogUploadRepository: Send + Sync {
    /// Inserts or replaces by id.
    async fn save(&self, upload: CatalogUpload) -> Result<(), RepositoryError>;
    async fn latest_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CatalogUpload>, RepositoryError>;
}

#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn record(&self, interaction: UserInteraction) -> Result<(), RepositoryError>;

    /// Newest first.
    async fn list(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<UserInteraction>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::{effective_limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

    #[test]
    fn list_limits_are_clamped() {
        assert_eq!(effective_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(effective_limit(Some(0)), 1);
        assert_eq!(effective_limit(Some(10)), 10);
        assert_eq!(effective_limit(Some(10_000)), MAX_LIST_LIMIT);
    }
}
