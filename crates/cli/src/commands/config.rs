use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pickwise_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map_or_else(|| "<unset>".to_string(), |key| redact_key(key.expose_secret()));

    let entries = vec![
        entry("database.url", config.database.url.clone(), &["PICKWISE_DATABASE_URL"]),
        entry(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["PICKWISE_DATABASE_MAX_CONNECTIONS"],
        ),
        entry(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["PICKWISE_DATABASE_TIMEOUT_SECS"],
        ),
        entry("llm.api_key", api_key, &["PICKWISE_LLM_API_KEY", "OPENROUTER_API_KEY"]),
        entry("llm.base_url", config.llm.base_url.clone(), &["PICKWISE_LLM_BASE_URL"]),
        entry("llm.models", config.llm.models.join(", "), &["PICKWISE_LLM_MODELS"]),
        entry("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["PICKWISE_LLM_TIMEOUT_SECS"]),
        entry("llm.max_tokens", config.llm.max_tokens.to_string(), &["PICKWISE_LLM_MAX_TOKENS"]),
        entry("llm.temperature", config.llm.temperature.to_string(), &["PICKWISE_LLM_TEMPERATURE"]),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["PICKWISE_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["PICKWISE_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["PICKWISE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry("upload.max_bytes", config.upload.max_bytes.to_string(), &["PICKWISE_UPLOAD_MAX_BYTES"]),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["PICKWISE_LOGGING_LEVEL", "PICKWISE_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["PICKWISE_LOGGING_FORMAT", "PICKWISE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in entries {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn entry(
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("pickwise.toml"), PathBuf::from("config/pickwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the provider prefix (`sk-or-...`) and the last four characters.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 12 {
        return "<redacted>".to_string();
    }
    let prefix = match trimmed.rsplit_once('-') {
        Some((prefix, _)) if prefix.len() <= 8 => format!("{prefix}-"),
        _ => String::new(),
    };
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}***{suffix}")
}
