use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pulseops_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

struct Entry {
    key: &'static str,
    env_key: &'static str,
    value: String,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::text(2, format!("config validation failed: {error}")),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in entries(&config) {
        let source = field_source(
            entry.key,
            entry.env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", entry.key, entry.value));
    }

    CommandResult::text(0, lines.join("\n"))
}

fn entries(config: &AppConfig) -> Vec<Entry> {
    let entry = |key: &'static str, env_key: &'static str, value: String| Entry {
        key,
        env_key,
        value,
    };
    let api_token = config
        .api
        .token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        entry("store.backend", "PULSEOPS_STORE_BACKEND", config.store.backend.as_str().to_string()),
        entry("database.url", "PULSEOPS_DATABASE_URL", config.database.url.clone()),
        entry(
            "database.max_connections",
            "PULSEOPS_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        entry(
            "database.timeout_secs",
            "PULSEOPS_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        entry("api.base_url", "PULSEOPS_API_BASE_URL", config.api.base_url.clone()),
        entry("api.token", "PULSEOPS_API_TOKEN", api_token),
        entry("api.timeout_secs", "PULSEOPS_API_TIMEOUT_SECS", config.api.timeout_secs.to_string()),
        entry(
            "server.bind_address",
            "PULSEOPS_SERVER_BIND_ADDRESS",
            config.server.bind_address.clone(),
        ),
        entry("server.port", "PULSEOPS_SERVER_PORT", config.server.port.to_string()),
        entry(
            "session.idle_timeout_secs",
            "PULSEOPS_SESSION_IDLE_TIMEOUT_SECS",
            config.session.idle_timeout_secs.to_string(),
        ),
        entry("logging.level", "PULSEOPS_LOGGING_LEVEL", config.logging.level.clone()),
        entry("logging.format", "PULSEOPS_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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

/// Keeps the last four characters of long tokens.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn short_tokens_are_fully_redacted() {
        assert_eq!(redact_token("  "), "<empty>");
        assert_eq!(redact_token("abc123"), "<redacted>");
        assert_eq!(redact_token("eyJhbGciOiJIUzI1NiJ9.payload.sig9"), "***sig9");
    }

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: toml::Value = "[api]\nbase_url = \"http://example\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "api.base_url"));
        assert!(!contains_path(&doc, "api.token"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
