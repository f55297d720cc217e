use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use bibliobot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "nlu.endpoint",
        &config.nlu.endpoint,
        source("nlu.endpoint", &["BIBLIOBOT_NLU_ENDPOINT", "CLU_ENDPOINT"]),
    ));
    lines.push(render_line(
        "nlu.key",
        redact_secret(config.nlu.key.expose_secret()),
        source("nlu.key", &["BIBLIOBOT_NLU_KEY", "CLU_KEY"]),
    ));
    lines.push(render_line(
        "nlu.project_name",
        &config.nlu.project_name,
        source("nlu.project_name", &["BIBLIOBOT_NLU_PROJECT_NAME", "CLU_PROJECT_NAME"]),
    ));
    lines.push(render_line(
        "nlu.deployment_name",
        &config.nlu.deployment_name,
        source("nlu.deployment_name", &["BIBLIOBOT_NLU_DEPLOYMENT_NAME", "CLU_DEPLOYMENT_NAME"]),
    ));
    lines.push(render_line(
        "nlu.api_version",
        &config.nlu.api_version,
        source("nlu.api_version", &["BIBLIOBOT_NLU_API_VERSION"]),
    ));
    lines.push(render_line(
        "nlu.timeout_secs",
        &config.nlu.timeout_secs.to_string(),
        source("nlu.timeout_secs", &["BIBLIOBOT_NLU_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "store.endpoint",
        &config.store.endpoint,
        source("store.endpoint", &["BIBLIOBOT_STORE_ENDPOINT", "COSMOS_ENDPOINT"]),
    ));
    lines.push(render_line(
        "store.key",
        redact_secret(config.store.key.expose_secret()),
        source("store.key", &["BIBLIOBOT_STORE_KEY", "COSMOS_KEY"]),
    ));
    lines.push(render_line(
        "store.database_id",
        &config.store.database_id,
        source("store.database_id", &["BIBLIOBOT_STORE_DATABASE_ID", "COSMOS_DATABASE_ID"]),
    ));
    lines.push(render_line(
        "store.container_id",
        &config.store.container_id,
        source("store.container_id", &["BIBLIOBOT_STORE_CONTAINER_ID", "COSMOS_CONTAINER_ID"]),
    ));
    lines.push(render_line(
        "store.timeout_secs",
        &config.store.timeout_secs.to_string(),
        source("store.timeout_secs", &["BIBLIOBOT_STORE_TIMEOUT_SECS"]),
    ));

    let app_id = if config.channel.app_id.trim().is_empty() {
        "<unset, emulator mode>"
    } else {
        config.channel.app_id.as_str()
    };
    lines.push(render_line(
        "channel.app_id",
        app_id,
        source("channel.app_id", &["BIBLIOBOT_CHANNEL_APP_ID", "MicrosoftAppId"]),
    ));
    lines.push(render_line(
        "channel.app_password",
        redact_secret(config.channel.app_password.expose_secret()),
        source("channel.app_password", &["BIBLIOBOT_CHANNEL_APP_PASSWORD", "MicrosoftAppPassword"]),
    ));
    lines.push(render_line(
        "channel.login_url",
        &config.channel.login_url,
        source("channel.login_url", &["BIBLIOBOT_CHANNEL_LOGIN_URL"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["BIBLIOBOT_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["BIBLIOBOT_SERVER_PORT"]),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        source("server.health_check_port", &["BIBLIOBOT_SERVER_HEALTH_CHECK_PORT"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["BIBLIOBOT_LOGGING_LEVEL", "BIBLIOBOT_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["BIBLIOBOT_LOGGING_FORMAT", "BIBLIOBOT_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("bibliobot.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/bibliobot.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
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
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
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

fn redact_secret(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
