use sqlx::sqlite::SqliteRow;

use pickwise_core::domain::upload::{CatalogUpload, UploadId};

use super::rows;
use super::{CatalogUploadRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogUploadRepository {
    pool: DbPool,
}

impl SqlCatalogUploadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_upload(row: &SqliteRow) -> Result<CatalogUpload, RepositoryError> {
    let products_extracted = rows::unsigned(row, "products_extracted")?;
    Ok(CatalogUpload {
        id: UploadId(rows::text(row, "id")?),
        session_id: rows::text(row, "session_id")?,
        user_id: rows::text(row, "user_id")?,
        file_name: rows::text(row, "file_name")?,
        file_size: rows::unsigned(row, "file_size")?,
        extracted_text: rows::text(row, "extracted_text")?,
        text_length: rows::unsigned(row, "text_length")?,
        products_extracted: u32::try_from(products_extracted).map_err(|_| {
            RepositoryError::Decode(format!("products_extracted out of range: {products_extracted}"))
        })?,
        status: rows::parse_label(row, "status")?,
        metadata: rows::json(row, "metadata_json")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

fn to_i64(value: u64, column: &str) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|_| RepositoryError::Decode(format!("{column} out of range")))
}

#[async_trait::async_trait]
impl CatalogUploadRepository for SqlCatalogUploadRepository {
    async fn save(&self, upload: CatalogUpload) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO catalog_upload
                (id, session_id, user_id, file_name, file_size, extracted_text, text_length,
                 products_extracted, status, metadata_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                products_extracted = excluded.products_extracted,
                status = excluded.status,
                metadata_json = excluded.metadata_json",
        )
        .bind(&upload.id.0)
        .bind(&upload.session_id)
        .bind(&upload.user_id)
        .bind(&upload.file_name)
        .bind(to_i64(upload.file_size, "file_size")?)
        .bind(&upload.extracted_text)
        .bind(to_i64(upload.text_length, "text_length")?)
        .bind(i64::from(upload.products_extracted))
        .bind(upload.status.as_str())
        .bind(rows::to_json(&upload.metadata)?)
        .bind(rows::format_timestamp(&upload.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_for_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CatalogUpload>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, session_id, user_id, file_name, file_size, extracted_text, text_length,
                    products_extracted, status, metadata_json, created_at
             FROM catalog_upload
             WHERE session_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_upload).transpose()
    }
}
