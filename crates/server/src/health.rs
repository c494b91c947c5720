use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pickwise_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    llm_enabled: bool,
}

impl HealthState {
    pub fn new(db_pool: DbPool, llm_enabled: bool) -> Self {
        Self { db_pool, llm_enabled }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub catalog: HealthCheck,
    /// Informational. Extraction and explanations degrade without a model.
    pub llm: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Readiness follows the database only.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, catalog) = match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product")
        .fetch_one(&state.db_pool)
        .await
    {
        Ok(count) => (
            HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
            HealthCheck {
                status: if count > 0 { "ready" } else { "empty" },
                detail: format!("{count} product(s) stored"),
            },
        ),
        Err(error) => (
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") },
            HealthCheck { status: "unknown", detail: "catalog not readable".to_string() },
        ),
    };
    let ready = database.status == "ready";

    let llm = if state.llm_enabled {
        HealthCheck { status: "ready", detail: "model-backed generation configured".to_string() }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "no API key configured; deterministic fallbacks only".to_string(),
        }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database,
        catalog,
        llm,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
