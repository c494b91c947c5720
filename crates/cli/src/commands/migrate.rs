use pickwise_db::{connect_with_settings, migrations};

use crate::commands::{current_thread_runtime, load_config, CommandResult, Failure};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match current_thread_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let pending = migrations::pending_versions(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<i64>, Failure>(pending)
    });

    match result {
        Ok(pending) if pending.is_empty() => {
            CommandResult::success("migrate", "schema already up to date")
        }
        Ok(pending) => CommandResult::success(
            "migrate",
            format!("applied {} pending migration(s): {:?}", pending.len(), pending),
        ),
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
