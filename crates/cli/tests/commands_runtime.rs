use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use pickwise_cli::commands::{doctor, extract, migrate, recommend, seed};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_applies_schema_then_reports_up_to_date() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("PICKWISE_DATABASE_URL", url.as_str())], || {
        let first = migrate::run();
        assert_eq!(first.exit_code, 0, "expected successful migrate run");
        let payload = parse_payload(&first.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(payload["message"].as_str().is_some_and(|m| m.starts_with("applied 1")));

        let second = parse_payload(&migrate::run().output);
        assert_eq!(second["message"], "schema already up to date");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("PICKWISE_DATABASE_URL", "postgres://localhost/catalog")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("PICKWISE_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["data"]["strategy"], "pattern");
        assert_eq!(first_payload["data"]["inserted"], 8);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["data"]["inserted"], 0);
        assert_eq!(second_payload["data"]["alreadyPresent"], 8);
    });
}

#[test]
fn extract_reports_normalized_products_without_persisting() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = dir.path().join("catalog.txt");
    fs::write(
        &catalog,
        "Running Shoe - footwear - $79.99 - Lightweight trainer\n\
         Running Shoes - footwear - $79.99 - Lightweight trainer\n\
         Rain Jacket - clothing - $120.00 - Waterproof shell\n",
    )
    .expect("write catalog");

    let url = database_url(&dir);
    with_env(&[("PICKWISE_DATABASE_URL", url.as_str())], || {
        let result = extract::run(&catalog, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["strategy"], "pattern");
        assert_eq!(payload["data"]["candidates"], 3);
        assert_eq!(payload["data"]["products"].as_array().map(Vec::len), Some(2));
        assert_eq!(payload["data"]["notice"], Value::Null);

        let human = extract::run(&catalog, false);
        assert!(human.output.lines().any(|line| line.contains("Rain Jacket (clothing, $120.00)")));
    });
}

#[test]
fn extract_rejects_missing_file() {
    with_env(&[], || {
        let result = extract::run(Path::new("/nonexistent/catalog.pdf"), true);

        assert_eq!(result.exit_code, 7);
        assert_eq!(parse_payload(&result.output)["error_class"], "input");
    });
}

#[test]
fn recommend_needs_a_catalog_then_ranks_seeded_products() {
    let dir = TempDir::new().expect("tempdir");
    let behavior = dir.path().join("behavior.json");
    fs::write(&behavior, r#"{"preferences": {"categories": ["footwear"], "maxPrice": 100}}"#)
        .expect("write behavior");

    let url = database_url(&dir);
    with_env(&[("PICKWISE_DATABASE_URL", url.as_str())], || {
        let empty = recommend::run(&behavior, 3);
        assert_eq!(empty.exit_code, 8);
        assert_eq!(parse_payload(&empty.output)["error_class"], "empty_catalog");

        assert_eq!(seed::run().exit_code, 0);
        let result = recommend::run(&behavior, 2);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let recommendations = &payload["data"]["recommendations"];
        assert_eq!(recommendations.as_array().map(Vec::len), Some(2));
        assert_eq!(recommendations[0]["title"], "Road Running Shoe");
        assert_eq!(recommendations[0]["score"], 50);
        assert!(payload["data"]["explanation"]
            .as_str()
            .is_some_and(|text| text.starts_with("- Road Running Shoe: category match: footwear")));
    });
}

#[test]
fn recommend_rejects_non_object_behavior() {
    let dir = TempDir::new().expect("tempdir");
    let behavior = dir.path().join("behavior.json");
    fs::write(&behavior, "[1, 2, 3]").expect("write behavior");

    with_env(&[], || {
        let result = recommend::run(&behavior, 3);

        assert_eq!(result.exit_code, 7);
        assert_eq!(parse_payload(&result.output)["message"], "Behavior object is required");
    });
}

#[test]
fn doctor_passes_on_migrated_database_without_llm_key() {
    let dir = TempDir::new().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("PICKWISE_DATABASE_URL", url.as_str())], || {
        let before = doctor::run(true);
        assert_eq!(before.exit_code, 1, "pending migrations should fail doctor");

        assert_eq!(migrate::run().exit_code, 0);
        let after = doctor::run(true);
        assert_eq!(after.exit_code, 0);

        let report = parse_payload(&after.output);
        assert_eq!(report["overall_status"], "pass");
        let llm = report["checks"]
            .as_array()
            .and_then(|checks| checks.iter().find(|check| check["name"] == "llm_readiness"))
            .expect("llm check");
        assert_eq!(llm["status"], "skipped");
    });
}

fn database_url(dir: &TempDir) -> String {
    let path: PathBuf = dir.path().join("pickwise.db");
    format!("sqlite://{}?mode=rwc", path.display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "PICKWISE_DATABASE_URL",
        "PICKWISE_DATABASE_MAX_CONNECTIONS",
        "PICKWISE_DATABASE_TIMEOUT_SECS",
        "PICKWISE_LLM_API_KEY",
        "OPENROUTER_API_KEY",
        "PICKWISE_LLM_BASE_URL",
        "PICKWISE_LLM_MODELS",
        "PICKWISE_LLM_TIMEOUT_SECS",
        "PICKWISE_LLM_MAX_TOKENS",
        "PICKWISE_LLM_TEMPERATURE",
        "PICKWISE_SERVER_BIND_ADDRESS",
        "PICKWISE_SERVER_PORT",
        "PICKWISE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PICKWISE_UPLOAD_MAX_BYTES",
        "PICKWISE_LOGGING_LEVEL",
        "PICKWISE_LOGGING_FORMAT",
        "PICKWISE_LOG_LEVEL",
        "PICKWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
