use std::time::Duration;

use async_trait::async_trait;
use bibliobot_core::config::NluConfig;
use bibliobot_core::ClassificationResult;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::response::decode_classification;

// Fixed single-utterance payload identifiers; the provider requires them but
// nothing here is conversational state.
const CONVERSATION_ITEM_ID: &str = "1";
const PARTICIPANT_ID: &str = "user_1";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("classification transport failure: {0}")]
    Transport(String),
    #[error("classification provider rejected the request with status {status}: {message}")]
    Provider { status: u16, message: String },
}

impl ClassifyError {
    /// Stable name surfaced in the user-facing technical-error reply.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Transport",
            Self::Provider { .. } => "Provider",
        }
    }
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError>;
}

/// HTTP adapter for the remote conversation-analysis service. Constructed
/// once at bootstrap with the fixed project/deployment identifiers and
/// shared for the process lifetime.
pub struct CluClassifier {
    client: Client,
    endpoint: String,
    key: SecretString,
    project_name: String,
    deployment_name: String,
    api_version: String,
}

impl CluClassifier {
    pub fn new(client: Client, config: &NluConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            project_name: config.project_name.clone(),
            deployment_name: config.deployment_name.clone(),
            api_version: config.api_version.clone(),
        }
    }

    pub fn from_config(config: &NluConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ClassifyError::Transport(error.to_string()))?;
        Ok(Self::new(client, config))
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/language/:analyze-conversations?api-version={}",
            self.endpoint, self.api_version
        )
    }

    fn task_payload(&self, text: &str) -> Value {
        json!({
            "kind": "Conversation",
            "analysisInput": {
                "conversationItem": {
                    "text": text,
                    "id": CONVERSATION_ITEM_ID,
                    "participantId": PARTICIPANT_ID,
                }
            },
            "parameters": {
                "projectName": self.project_name,
                "deploymentName": self.deployment_name,
                "isLoggingEnabled": false,
            }
        })
    }
}

#[async_trait]
impl IntentClassifier for CluClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", self.key.expose_secret())
            .json(&self.task_payload(text))
            .send()
            .await
            .map_err(|error| ClassifyError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Provider {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|error| ClassifyError::Transport(error.to_string()))?;

        let result = decode_classification(&payload);
        debug!(
            event_name = "nlu.classified",
            top_intent = %result.top_intent,
            confidence = result.confidence,
            "classification response normalized"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use bibliobot_core::config::AppConfig;

    use super::{CluClassifier, ClassifyError};

    fn classifier() -> CluClassifier {
        let mut config = AppConfig::default();
        config.nlu.endpoint = "https://lang.example.net/".to_string();
        config.nlu.key = "test-key".to_string().into();
        CluClassifier::new(reqwest::Client::new(), &config.nlu)
    }

    #[test]
    fn analyze_url_strips_trailing_slash_and_pins_api_version() {
        assert_eq!(
            classifier().analyze_url(),
            "https://lang.example.net/language/:analyze-conversations?api-version=2023-04-01"
        );
    }

    #[test]
    fn task_payload_carries_fixed_conversation_identity_and_disables_logging() {
        let payload = classifier().task_payload("Qual o horário de funcionamento?");

        assert_eq!(payload["kind"], "Conversation");
        let item = &payload["analysisInput"]["conversationItem"];
        assert_eq!(item["text"], "Qual o horário de funcionamento?");
        assert_eq!(item["id"], "1");
        assert_eq!(item["participantId"], "user_1");

        let parameters = &payload["parameters"];
        assert_eq!(parameters["projectName"], "BibliotecaCLU");
        assert_eq!(parameters["deploymentName"], "Producao");
        assert_eq!(parameters["isLoggingEnabled"], false);
    }

    #[test]
    fn error_categories_are_stable_names() {
        assert_eq!(ClassifyError::Transport("timeout".to_string()).category(), "Transport");
        assert_eq!(
            ClassifyError::Provider { status: 500, message: String::new() }.category(),
            "Provider"
        );
    }
}
