use std::sync::Arc;
use std::time::Duration;

use bibliobot_agent::LibraryBot;
use bibliobot_channel::{ChannelAdapter, HttpConnector};
use bibliobot_core::config::{AppConfig, ConfigError, LoadOptions};
use bibliobot_nlu::{ClassifyError, CluClassifier};
use bibliobot_store::{CosmosRestStore, RulesRepository, StoreError};
use thiserror::Error;
use tracing::info;

const CONNECTOR_TIMEOUT_SECS: u64 = 30;

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<CosmosRestStore>,
    pub adapter: Arc<ChannelAdapter>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("document store client initialization failed: {0}")]
    Store(#[source] StoreError),
    #[error("classifier client initialization failed: {0}")]
    Classifier(#[source] ClassifyError),
    #[error("channel connector client initialization failed: {0}")]
    Connector(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Wires the remote collaborators together. Nothing here performs network
/// I/O; the first round trips happen on the first inbound activity.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store = Arc::new(CosmosRestStore::from_config(&config.store).map_err(BootstrapError::Store)?);
    let rules = Arc::new(RulesRepository::new(store.clone()));

    let classifier =
        Arc::new(CluClassifier::from_config(&config.nlu).map_err(BootstrapError::Classifier)?);

    let connector_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(CONNECTOR_TIMEOUT_SECS))
        .build()
        .map_err(BootstrapError::Connector)?;
    let connector = Arc::new(HttpConnector::new(connector_client, &config.channel));

    let bot = Arc::new(LibraryBot::new(rules, classifier));
    let adapter = Arc::new(ChannelAdapter::new(connector, bot));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        nlu_project = %config.nlu.project_name,
        store_database = %config.store.database_id,
        store_container = %config.store.container_id,
        "application collaborators wired"
    );

    Ok(Application { config, store, adapter })
}

#[cfg(test)]
mod tests {
    use bibliobot_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            nlu_endpoint: Some("https://lang.example.net".to_string()),
            nlu_key: Some("nlu-test-key".to_string()),
            store_endpoint: Some("https://docs.example.net".to_string()),
            store_key: Some(String::from("c3RvcmUtdGVzdC1rZXk=")),
            ..ConfigOverrides::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_succeeds_with_valid_overrides() {
        let app = bootstrap(LoadOptions {
            overrides: valid_overrides(),
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.config.nlu.project_name, "BibliotecaCLU");
        assert_eq!(app.config.server.port, 9000);
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_classifier_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides { nlu_key: None, ..valid_overrides() },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap must fail").to_string();
        assert!(message.contains("nlu.key"));
    }
}
