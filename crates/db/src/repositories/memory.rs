use std::collections::HashMap;

use tokio::sync::RwLock;

use pickwise_core::domain::interaction::UserInteraction;
use pickwise_core::domain::product::{Product, ProductId};
use pickwise_core::domain::upload::CatalogUpload;

use super::{
    effective_limit, CatalogUploadRepository, InteractionFilter, InteractionRepository,
    ProductFilter, ProductRepository, RepositoryError,
};

/// Products kept in insertion order so listing matches the SQL catalog order.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| product.sku == sku).cloned())
    }

    async fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        if products.iter().any(|existing| existing.sku == product.sku) {
            return Err(RepositoryError::DuplicateSku(product.sku));
        }
        products.push(product);
        Ok(())
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let limit = filter.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(products
            .iter()
            .filter(|product| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |category| product.category.eq_ignore_ascii_case(category))
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.products.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCatalogUploadRepository {
    uploads: RwLock<HashMap<String, CatalogUpload>>,
}

#[async_trait::async_trait]
impl CatalogUploadRepository for InMemoryCatalogUploadRepository {
    async fn save(&self, upload: CatalogUpload) -> Result<(), RepositoryError> {
        let mut uploads = self.uploads.write().await;
        uploads.insert(upload.id.0.clone(), upload);
        Ok(())
    }

    async fn latest_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CatalogUpload>, RepositoryError> {
        let uploads = self.uploads.read().await;
        Ok(uploads
            .values()
            .filter(|upload| upload.session_id == session_id)
            .max_by_key(|upload| upload.created_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryInteractionRepository {
    interactions: RwLock<Vec<UserInteraction>>,
}

#[async_trait::async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn record(&self, interaction: UserInteraction) -> Result<(), RepositoryError> {
        self.interactions.write().await.push(interaction);
        Ok(())
    }

    async fn list(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<UserInteraction>, RepositoryError> {
        let interactions = self.interactions.read().await;
        let mut matching: Vec<UserInteraction> = interactions
            .iter()
            .filter(|item| filter.session_id.as_ref().map_or(true, |id| &item.session_id == id))
            .filter(|item| filter.user_id.as_ref().map_or(true, |id| &item.user_id == id))
            .filter(|item| filter.interaction_type.map_or(true, |kind| item.interaction_type == kind))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(effective_limit(filter.limit) as usize);
        Ok(matching)
    }
}
