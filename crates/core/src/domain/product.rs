use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub tags: Vec<String>,
    pub stock: u32,
    pub sku: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A deduplicated, product-ready record that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub tags: Vec<String>,
    pub sku: String,
    pub stock: u32,
    pub metadata: serde_json::Value,
}

impl ProductDraft {
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            price: self.price,
            tags: self.tags,
            stock: self.stock,
            sku: self.sku,
            metadata: self.metadata,
            created_at,
        }
    }
}
