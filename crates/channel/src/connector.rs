use async_trait::async_trait;
use bibliobot_core::config::ChannelConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::activity::Activity;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("reply could not be delivered: {0}")]
    Send(String),
    #[error("channel authentication failed: {0}")]
    Auth(String),
    #[error("activity is missing `{0}`, reply cannot be addressed")]
    MissingField(&'static str),
}

/// Outbound side of the transport: delivers one reply activity.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_activity(&self, activity: &Activity) -> Result<(), ChannelError>;
}

/// Posts replies back to the service URL carried by the inbound activity.
///
/// With app credentials configured, a bearer token is fetched from the
/// channel login endpoint per send; with empty credentials the request goes
/// out unauthenticated, which is what the local emulator expects.
pub struct HttpConnector {
    client: Client,
    credentials: Option<AppCredentials>,
    login_url: String,
}

struct AppCredentials {
    app_id: String,
    app_password: SecretString,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl HttpConnector {
    pub fn new(client: Client, config: &ChannelConfig) -> Self {
        let credentials = (!config.app_id.trim().is_empty()).then(|| AppCredentials {
            app_id: config.app_id.clone(),
            app_password: config.app_password.clone(),
        });
        Self { client, credentials, login_url: config.login_url.clone() }
    }

    async fn bearer_token(&self, credentials: &AppCredentials) -> Result<String, ChannelError> {
        let response = self
            .client
            .post(&self.login_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.app_id.as_str()),
                ("client_secret", credentials.app_password.expose_secret()),
                ("scope", "https://api.botframework.com/.default"),
            ])
            .send()
            .await
            .map_err(|error| ChannelError::Auth(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Auth(format!(
                "login endpoint answered {status}",
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|error| ChannelError::Auth(error.to_string()))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl ReplySender for HttpConnector {
    async fn send_activity(&self, activity: &Activity) -> Result<(), ChannelError> {
        let service_url = activity
            .service_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or(ChannelError::MissingField("serviceUrl"))?;
        let conversation_id = activity
            .conversation
            .as_ref()
            .map(|conversation| conversation.id.as_str())
            .ok_or(ChannelError::MissingField("conversation"))?;

        let url = format!("{service_url}/v3/conversations/{conversation_id}/activities");
        let mut request = self.client.post(&url).json(activity);
        if let Some(credentials) = &self.credentials {
            let token = self.bearer_token(credentials).await?;
            request = request.bearer_auth(token);
        }

        let response =
            request.send().await.map_err(|error| ChannelError::Send(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(
                event_name = "channel.reply_sent",
                conversation_id,
                "reply activity delivered"
            );
            Ok(())
        } else {
            Err(ChannelError::Send(format!("channel answered {status}")))
        }
    }
}

/// Test double that records every activity it is asked to deliver.
#[derive(Default)]
pub struct RecordingReplySender {
    sent: Mutex<Vec<Activity>>,
    fail_next: Mutex<bool>,
}

impl RecordingReplySender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Activity> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|activity| activity.text.clone())
            .collect()
    }

    pub async fn fail_next_send(&self) {
        *self.fail_next.lock().await = true;
    }
}

#[async_trait]
impl ReplySender for RecordingReplySender {
    async fn send_activity(&self, activity: &Activity) -> Result<(), ChannelError> {
        if std::mem::take(&mut *self.fail_next.lock().await) {
            return Err(ChannelError::Send("scripted send failure".to_string()));
        }
        self.sent.lock().await.push(activity.clone());
        Ok(())
    }
}
