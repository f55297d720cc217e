use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bibliobot_core::config::StoreConfig;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth;

const STORE_API_VERSION: &str = "2018-12-31";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("document store transport failure: {0}")]
    Transport(String),
    #[error("document store rejected the request with status {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("document `{0}` was not found")]
    NotFound(String),
    #[error("document store authorization failed: {0}")]
    Auth(String),
    #[error("document payload could not be decoded: {0}")]
    Decode(String),
    #[error("business rules are unavailable: {0}")]
    RulesUnavailable(String),
}

impl From<auth::AuthError> for StoreError {
    fn from(error: auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}

/// Narrow seam to the remote document store: point read and idempotent
/// upsert, both keyed by the document `id` (which doubles as the partition
/// key). Everything else about the store is out of scope.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read_document(&self, id: &str) -> Result<Value, StoreError>;
    async fn upsert_document(&self, document: &Value) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn read_document(&self, id: &str) -> Result<Value, StoreError> {
        (**self).read_document(id).await
    }

    async fn upsert_document(&self, document: &Value) -> Result<(), StoreError> {
        (**self).upsert_document(document).await
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    async fn read_document(&self, id: &str) -> Result<Value, StoreError> {
        (**self).read_document(id).await
    }

    async fn upsert_document(&self, document: &Value) -> Result<(), StoreError> {
        (**self).upsert_document(document).await
    }
}

/// Cosmos-compatible REST client. One instance is built at bootstrap and
/// shared for the process lifetime; the underlying reqwest client is safe
/// for interleaved calls.
pub struct CosmosRestStore {
    client: Client,
    endpoint: String,
    key: SecretString,
    collection_link: String,
}

impl CosmosRestStore {
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            collection_link: format!(
                "dbs/{}/colls/{}",
                config.database_id, config.container_id
            ),
        }
    }

    /// Builds a dedicated HTTP client honoring the configured timeout.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| StoreError::Transport(error.to_string()))?;
        Ok(Self::new(client, config))
    }

    fn partition_key_header(id: &str) -> String {
        // The store expects a JSON array literal in the header.
        serde_json::to_string(&[id]).unwrap_or_else(|_| format!("[\"{id}\"]"))
    }
}

#[async_trait]
impl DocumentStore for CosmosRestStore {
    async fn read_document(&self, id: &str) -> Result<Value, StoreError> {
        let resource_link = format!("{}/docs/{}", self.collection_link, id);
        let date = auth::signing_date();
        let token =
            auth::authorization_token("get", "docs", &resource_link, &date, self.key.expose_secret())?;

        let response = self
            .client
            .get(format!("{}/{}", self.endpoint, resource_link))
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", STORE_API_VERSION)
            .header("x-ms-documentdb-partitionkey", Self::partition_key_header(id))
            .send()
            .await
            .map_err(|error| StoreError::Transport(error.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status if status.is_success() => {
                debug!(event_name = "store.document_read", document_id = id, "document retrieved");
                response
                    .json::<Value>()
                    .await
                    .map_err(|error| StoreError::Decode(error.to_string()))
            }
            status => Err(StoreError::Provider {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn upsert_document(&self, document: &Value) -> Result<(), StoreError> {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("document is missing an `id` field".to_string()))?;

        let date = auth::signing_date();
        let token = auth::authorization_token(
            "post",
            "docs",
            &self.collection_link,
            &date,
            self.key.expose_secret(),
        )?;

        let response = self
            .client
            .post(format!("{}/{}/docs", self.endpoint, self.collection_link))
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", STORE_API_VERSION)
            .header("x-ms-documentdb-partitionkey", Self::partition_key_header(id))
            .header("x-ms-documentdb-is-upsert", "true")
            .json(document)
            .send()
            .await
            .map_err(|error| StoreError::Transport(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(event_name = "store.document_upserted", document_id = id, "document upserted");
            Ok(())
        } else {
            Err(StoreError::Provider {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// In-memory store used by tests and by the health endpoint's unit tests.
/// Behaves like an empty container until something is upserted.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, Value>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_document(document: Value) -> Self {
        let store = Self::new();
        store.upsert_document(&document).await.expect("in-memory upsert cannot fail");
        store
    }

    pub async fn document_count(&self) -> usize {
        self.documents.lock().await.len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read_document(&self, id: &str) -> Result<Value, StoreError> {
        self.documents
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn upsert_document(&self, document: &Value) -> Result<(), StoreError> {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("document is missing an `id` field".to_string()))?;
        self.documents.lock().await.insert(id.to_string(), document.clone());
        Ok(())
    }
}
