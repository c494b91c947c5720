use sqlx::sqlite::SqliteRow;

use pickwise_core::domain::product::{Product, ProductId};

use super::rows;
use super::{ProductFilter, ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, title, description, category, price, tags_json, stock, sku,
                               metadata_json, created_at";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let stock = rows::unsigned(row, "stock")?;
    Ok(Product {
        id: ProductId(rows::text(row, "id")?),
        title: rows::text(row, "title")?,
        description: rows::text(row, "description")?,
        category: rows::text(row, "category")?,
        price: rows::decimal(row, "price")?,
        tags: rows::json(row, "tags_json")?,
        stock: u32::try_from(stock)
            .map_err(|_| RepositoryError::Decode(format!("stock out of range: {stock}")))?,
        sku: rows::text(row, "sku")?,
        metadata: rows::json(row, "metadata_json")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE sku = ?"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO product
                (id, title, description, category, price, tags_json, stock, sku,
                 metadata_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id.0)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.to_string())
        .bind(rows::to_json(&product.tags)?)
        .bind(i64::from(product.stock))
        .bind(&product.sku)
        .bind(rows::to_json(&product.metadata)?)
        .bind(rows::format_timestamp(&product.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => {
                Err(RepositoryError::DuplicateSku(product.sku))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        // sqlite treats a negative LIMIT as unbounded.
        let limit = filter.limit.map_or(-1, i64::from);
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM product
             WHERE (?1 IS NULL OR category = ?1 COLLATE NOCASE)
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?2"
        ))
        .bind(filter.category.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use pickwise_core::domain::product::{Product, ProductDraft, ProductId};

    use super::SqlProductRepository;
    use crate::repositories::{ProductFilter, ProductRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlProductRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlProductRepository::new(pool)
    }

    fn product(id: &str, sku: &str, category: &str, minutes_ago: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            title: format!("Product {id}"),
            description: "Sturdy".to_string(),
            category: category.to_string(),
            price: Decimal::new(4999, 2),
            tags: vec!["sturdy".to_string(), "outdoor".to_string()],
            stock: 3,
            sku: sku.to_string(),
            metadata: json!({"source": "pattern"}),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn sql_product_repo_round_trip() {
        let repo = repo().await;
        let product = product("p-1", "OUT-AAAAAAAAAA", "outdoor", 0);

        repo.insert(product.clone()).await.expect("insert");
        let by_id = repo.find_by_id(&product.id).await.expect("find by id");
        let by_sku = repo.find_by_sku("OUT-AAAAAAAAAA").await.expect("find by sku");

        let by_id = by_id.expect("present");
        assert_eq!(by_id.price, Decimal::new(4999, 2));
        assert_eq!(by_id.tags, product.tags);
        assert_eq!(by_id.metadata, product.metadata);
        assert_eq!(by_sku.map(|found| found.id), Some(product.id));
    }

    #[tokio::test]
    async fn duplicate_sku_is_reported_not_overwritten() {
        let repo = repo().await;
        repo.insert(product("p-1", "OUT-AAAAAAAAAA", "outdoor", 0)).await.expect("insert");

        let error = repo
            .insert(product("p-2", "OUT-AAAAAAAAAA", "outdoor", 0))
            .await
            .expect_err("duplicate");

        assert!(matches!(error, RepositoryError::DuplicateSku(ref sku) if sku == "OUT-AAAAAAAAAA"));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn list_filters_by_category_in_catalog_order() {
        let repo = repo().await;
        repo.insert(product("p-new", "OUT-1", "outdoor", 1)).await.expect("insert");
        repo.insert(product("p-old", "OUT-2", "outdoor", 10)).await.expect("insert");
        repo.insert(product("p-shoe", "FOO-1", "footwear", 5)).await.expect("insert");

        let outdoor = repo
            .list(&ProductFilter { category: Some("Outdoor".to_string()), limit: None })
            .await
            .expect("list");
        let ids: Vec<_> = outdoor.iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids, vec!["p-old", "p-new"]);

        let limited =
            repo.list(&ProductFilter { category: None, limit: Some(2) }).await.expect("list");
        assert_eq!(limited.len(), 2);
        assert_eq!(repo.list(&ProductFilter::all()).await.expect("all").len(), 3);
    }

    #[tokio::test]
    async fn insert_drafts_skips_taken_skus() {
        let repo = repo().await;
        repo.insert(product("p-1", "FOO-TAKEN", "footwear", 0)).await.expect("insert");

        let draft = |sku: &str| ProductDraft {
            title: "Trail Runner".to_string(),
            description: String::new(),
            category: "footwear".to_string(),
            price: Decimal::new(120, 0),
            tags: Vec::new(),
            sku: sku.to_string(),
            stock: 0,
            metadata: json!({}),
        };

        let summary = repo
            .insert_drafts(vec![draft("FOO-TAKEN"), draft("FOO-FRESH")])
            .await
            .expect("persist");

        assert_eq!(summary.inserted.len(), 1);
        assert_eq!(summary.skipped_duplicates, vec!["FOO-TAKEN".to_string()]);
        assert_eq!(repo.count().await.expect("count"), 2);
    }
}
