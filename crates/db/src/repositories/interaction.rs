use sqlx::sqlite::SqliteRow;

use pickwise_core::domain::interaction::{InteractionId, UserInteraction};

use super::rows;
use super::{effective_limit, InteractionFilter, InteractionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_interaction(row: &SqliteRow) -> Result<UserInteraction, RepositoryError> {
    Ok(UserInteraction {
        id: InteractionId(rows::text(row, "id")?),
        session_id: rows::text(row, "session_id")?,
        user_id: rows::text(row, "user_id")?,
        interaction_type: rows::parse_label(row, "interaction_type")?,
        query: rows::optional_text(row, "query")?,
        products: rows::json(row, "products_json")?,
        ai_response: rows::optional_text(row, "ai_response")?,
        metadata: rows::json(row, "metadata_json")?,
        created_at: rows::timestamp(row, "created_at")?,
    })
}

#[async_trait::async_trait]
impl InteractionRepository for SqlInteractionRepository {
    async fn record(&self, interaction: UserInteraction) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_interaction
                (id, session_id, user_id, interaction_type, query, products_json,
                 ai_response, metadata_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&interaction.id.0)
        .bind(&interaction.session_id)
        .bind(&interaction.user_id)
        .bind(interaction.interaction_type.as_str())
        .bind(interaction.query.as_deref())
        .bind(rows::to_json(&interaction.products)?)
        .bind(interaction.ai_response.as_deref())
        .bind(rows::to_json(&interaction.metadata)?)
        .bind(rows::format_timestamp(&interaction.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(
        &self,
        filter: &InteractionFilter,
    ) -> Result<Vec<UserInteraction>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, session_id, user_id, interaction_type, query, products_json,
                    ai_response, metadata_json, created_at
             FROM user_interaction
             WHERE (?1 IS NULL OR session_id = ?1)
               AND (?2 IS NULL OR user_id = ?2)
               AND (?3 IS NULL OR interaction_type = ?3)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?4",
        )
        .bind(filter.session_id.as_deref())
        .bind(filter.user_id.as_deref())
        .bind(filter.interaction_type.map(|kind| kind.as_str()))
        .bind(i64::from(effective_limit(filter.limit)))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_interaction).collect()
    }
}
