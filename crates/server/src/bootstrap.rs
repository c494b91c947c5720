use pickwise_agent::{AgentRuntime, LlmError};
use pickwise_core::config::{AppConfig, ConfigError};
use pickwise_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub agent_runtime: AgentRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("language model runtime failed to initialize: {0}")]
    Agent(#[source] LlmError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let agent_runtime = AgentRuntime::from_config(&config.llm).map_err(BootstrapError::Agent)?;
    info!(
        event_name = "system.bootstrap.agent_ready",
        correlation_id = "bootstrap",
        llm_enabled = agent_runtime.is_enabled(),
        models = config.llm.models.len(),
        "language model runtime initialized"
    );

    Ok(Application { config, db_pool, agent_runtime })
}

#[cfg(test)]
mod tests {
    use pickwise_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use pickwise_db::fixtures::DemoCatalog;
    use pickwise_db::repositories::SqlProductRepository;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(overrides("postgres://nowhere/catalog")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_accepts_a_seeded_catalog() {
        let app = bootstrap(overrides("sqlite::memory:?cache=shared")).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('product', 'catalog_upload', 'user_interaction')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("catalog tables");
        assert_eq!(table_count, 3);

        let repo = SqlProductRepository::new(app.db_pool.clone());
        DemoCatalog::load(&repo).await.expect("seed");
        assert!(DemoCatalog::verify(&repo).await.expect("verify").all_present);

        app.db_pool.close().await;
    }
}
