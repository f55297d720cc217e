use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-wide settings, resolved once at startup.
///
/// Precedence: programmatic overrides > environment > config file > defaults.
/// Legacy environment names from the original deployment (`CLU_*`,
/// `COSMOS_*`, `MicrosoftAppId`/`MicrosoftAppPassword`) are honored as
/// fallbacks behind the `BIBLIOBOT_*` names.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub nlu: NluConfig,
    pub store: StoreConfig,
    pub channel: ChannelConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Remote conversation-analysis provider.
#[derive(Clone, Debug)]
pub struct NluConfig {
    pub endpoint: String,
    pub key: SecretString,
    pub project_name: String,
    pub deployment_name: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

/// Remote document store holding the business-rules document.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub endpoint: String,
    pub key: SecretString,
    pub database_id: String,
    pub container_id: String,
    pub timeout_secs: u64,
}

/// Bot channel credentials. Both fields empty means unauthenticated
/// (emulator) mode; partially set credentials fail validation.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub app_id: String,
    pub app_password: SecretString,
    pub login_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub nlu_endpoint: Option<String>,
    pub nlu_key: Option<String>,
    pub nlu_project_name: Option<String>,
    pub nlu_deployment_name: Option<String>,
    pub store_endpoint: Option<String>,
    pub store_key: Option<String>,
    pub store_database_id: Option<String>,
    pub store_container_id: Option<String>,
    pub channel_app_id: Option<String>,
    pub channel_app_password: Option<String>,
    pub server_bind_address: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nlu: NluConfig {
                endpoint: String::new(),
                key: String::new().into(),
                project_name: "BibliotecaCLU".to_string(),
                deployment_name: "Producao".to_string(),
                api_version: "2023-04-01".to_string(),
                timeout_secs: 30,
            },
            store: StoreConfig {
                endpoint: String::new(),
                key: String::new().into(),
                database_id: "BibliotecaDB".to_string(),
                container_id: "Regras".to_string(),
                timeout_secs: 30,
            },
            channel: ChannelConfig {
                app_id: String::new(),
                app_password: String::new().into(),
                login_url:
                    "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token"
                        .to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 9000,
                health_check_port: 8080,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("bibliobot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(nlu) = patch.nlu {
            if let Some(endpoint) = nlu.endpoint {
                self.nlu.endpoint = endpoint;
            }
            if let Some(nlu_key_value) = nlu.key {
                self.nlu.key = secret_value(nlu_key_value);
            }
            if let Some(project_name) = nlu.project_name {
                self.nlu.project_name = project_name;
            }
            if let Some(deployment_name) = nlu.deployment_name {
                self.nlu.deployment_name = deployment_name;
            }
            if let Some(api_version) = nlu.api_version {
                self.nlu.api_version = api_version;
            }
            if let Some(timeout_secs) = nlu.timeout_secs {
                self.nlu.timeout_secs = timeout_secs;
            }
        }

        if let Some(store) = patch.store {
            if let Some(endpoint) = store.endpoint {
                self.store.endpoint = endpoint;
            }
            if let Some(store_key_value) = store.key {
                self.store.key = secret_value(store_key_value);
            }
            if let Some(database_id) = store.database_id {
                self.store.database_id = database_id;
            }
            if let Some(container_id) = store.container_id {
                self.store.container_id = container_id;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(channel) = patch.channel {
            if let Some(app_id) = channel.app_id {
                self.channel.app_id = app_id;
            }
            if let Some(app_password_value) = channel.app_password {
                self.channel.app_password = secret_value(app_password_value);
            }
            if let Some(login_url) = channel.login_url {
                self.channel.login_url = login_url;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BIBLIOBOT_NLU_ENDPOINT").or_else(|| read_env("CLU_ENDPOINT"))
        {
            self.nlu.endpoint = value;
        }
        if let Some(value) = read_env("BIBLIOBOT_NLU_KEY").or_else(|| read_env("CLU_KEY")) {
            self.nlu.key = secret_value(value);
        }
        if let Some(value) =
            read_env("BIBLIOBOT_NLU_PROJECT_NAME").or_else(|| read_env("CLU_PROJECT_NAME"))
        {
            self.nlu.project_name = value;
        }
        if let Some(value) =
            read_env("BIBLIOBOT_NLU_DEPLOYMENT_NAME").or_else(|| read_env("CLU_DEPLOYMENT_NAME"))
        {
            self.nlu.deployment_name = value;
        }
        if let Some(value) = read_env("BIBLIOBOT_NLU_API_VERSION") {
            self.nlu.api_version = value;
        }
        if let Some(value) = read_env("BIBLIOBOT_NLU_TIMEOUT_SECS") {
            self.nlu.timeout_secs = parse_u64("BIBLIOBOT_NLU_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) =
            read_env("BIBLIOBOT_STORE_ENDPOINT").or_else(|| read_env("COSMOS_ENDPOINT"))
        {
            self.store.endpoint = value;
        }
        if let Some(value) = read_env("BIBLIOBOT_STORE_KEY").or_else(|| read_env("COSMOS_KEY")) {
            self.store.key = secret_value(value);
        }
        if let Some(value) =
            read_env("BIBLIOBOT_STORE_DATABASE_ID").or_else(|| read_env("COSMOS_DATABASE_ID"))
        {
            self.store.database_id = value;
        }
        if let Some(value) =
            read_env("BIBLIOBOT_STORE_CONTAINER_ID").or_else(|| read_env("COSMOS_CONTAINER_ID"))
        {
            self.store.container_id = value;
        }
        if let Some(value) = read_env("BIBLIOBOT_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("BIBLIOBOT_STORE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) =
            read_env("BIBLIOBOT_CHANNEL_APP_ID").or_else(|| read_env("MicrosoftAppId"))
        {
            self.channel.app_id = value;
        }
        if let Some(value) =
            read_env("BIBLIOBOT_CHANNEL_APP_PASSWORD").or_else(|| read_env("MicrosoftAppPassword"))
        {
            self.channel.app_password = secret_value(value);
        }
        if let Some(value) = read_env("BIBLIOBOT_CHANNEL_LOGIN_URL") {
            self.channel.login_url = value;
        }

        if let Some(value) = read_env("BIBLIOBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BIBLIOBOT_SERVER_PORT") {
            self.server.port = parse_u16("BIBLIOBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("BIBLIOBOT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("BIBLIOBOT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("BIBLIOBOT_LOGGING_LEVEL").or_else(|| read_env("BIBLIOBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BIBLIOBOT_LOGGING_FORMAT").or_else(|| read_env("BIBLIOBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(nlu_endpoint) = overrides.nlu_endpoint {
            self.nlu.endpoint = nlu_endpoint;
        }
        if let Some(nlu_key) = overrides.nlu_key {
            self.nlu.key = secret_value(nlu_key);
        }
        if let Some(nlu_project_name) = overrides.nlu_project_name {
            self.nlu.project_name = nlu_project_name;
        }
        if let Some(nlu_deployment_name) = overrides.nlu_deployment_name {
            self.nlu.deployment_name = nlu_deployment_name;
        }
        if let Some(store_endpoint) = overrides.store_endpoint {
            self.store.endpoint = store_endpoint;
        }
        if let Some(store_key) = overrides.store_key {
            self.store.key = secret_value(store_key);
        }
        if let Some(store_database_id) = overrides.store_database_id {
            self.store.database_id = store_database_id;
        }
        if let Some(store_container_id) = overrides.store_container_id {
            self.store.container_id = store_container_id;
        }
        if let Some(channel_app_id) = overrides.channel_app_id {
            self.channel.app_id = channel_app_id;
        }
        if let Some(channel_app_password) = overrides.channel_app_password {
            self.channel.app_password = secret_value(channel_app_password);
        }
        if let Some(server_bind_address) = overrides.server_bind_address {
            self.server.bind_address = server_bind_address;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_nlu(&self.nlu)?;
        validate_store(&self.store)?;
        validate_channel(&self.channel)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("bibliobot.toml"), PathBuf::from("config/bibliobot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_nlu(nlu: &NluConfig) -> Result<(), ConfigError> {
    validate_https_endpoint("nlu.endpoint", &nlu.endpoint)?;
    if nlu.key.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "nlu.key is required (subscription key of the language resource)".to_string(),
        ));
    }
    if nlu.project_name.trim().is_empty() {
        return Err(ConfigError::Validation("nlu.project_name must not be empty".to_string()));
    }
    if nlu.deployment_name.trim().is_empty() {
        return Err(ConfigError::Validation("nlu.deployment_name must not be empty".to_string()));
    }
    validate_timeout("nlu.timeout_secs", nlu.timeout_secs)?;
    Ok(())
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    validate_https_endpoint("store.endpoint", &store.endpoint)?;
    if store.key.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "store.key is required (primary key of the document store account)".to_string(),
        ));
    }
    if store.database_id.trim().is_empty() {
        return Err(ConfigError::Validation("store.database_id must not be empty".to_string()));
    }
    if store.container_id.trim().is_empty() {
        return Err(ConfigError::Validation("store.container_id must not be empty".to_string()));
    }
    validate_timeout("store.timeout_secs", store.timeout_secs)?;
    Ok(())
}

fn validate_channel(channel: &ChannelConfig) -> Result<(), ConfigError> {
    let has_id = !channel.app_id.trim().is_empty();
    let has_password = !channel.app_password.expose_secret().is_empty();
    if has_id != has_password {
        return Err(ConfigError::Validation(
            "channel.app_id and channel.app_password must be set together (leave both empty for emulator mode)"
                .to_string(),
        ));
    }
    if !channel.login_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "channel.login_url must be an https URL".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.health_check_port == server.port {
        return Err(ConfigError::Validation(
            "server.health_check_port must differ from server.port".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    let level = logging.level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of trace|debug|info|warn|error, got `{}`",
            logging.level
        )));
    }
    Ok(())
}

fn validate_https_endpoint(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Validation(format!("{field} is required")));
    }
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(ConfigError::Validation(format!("{field} must be an http(s) URL")));
    }
    Ok(())
}

fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > 300 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=300")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.into() })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.into() })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    nlu: Option<NluPatch>,
    store: Option<StorePatch>,
    channel: Option<ChannelPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    endpoint: Option<String>,
    key: Option<String>,
    project_name: Option<String>,
    deployment_name: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    endpoint: Option<String>,
    key: Option<String>,
    database_id: Option<String>,
    container_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPatch {
    app_id: Option<String>,
    app_password: Option<String>,
    login_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
