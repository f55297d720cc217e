use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bibliobot_core::RULES_DOCUMENT_ID;
use bibliobot_store::{DocumentStore, StoreError};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn DocumentStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub document_store: HealthCheck,
    pub checked_at: String,
}

pub fn router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    store: Arc<dyn DocumentStore>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(store)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let document_store = store_check(state.store.as_ref()).await;
    let ready = document_store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "bibliobot-server runtime initialized".to_string(),
        },
        document_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// Probes the store with a point read of the rules document. A miss still
/// counts as reachable; the repository seeds the document on the first turn.
async fn store_check(store: &dyn DocumentStore) -> HealthCheck {
    match store.read_document(RULES_DOCUMENT_ID).await {
        Ok(_) => HealthCheck {
            status: "ready",
            detail: "rules document read succeeded".to_string(),
        },
        Err(StoreError::NotFound(_)) => HealthCheck {
            status: "ready",
            detail: "document store reachable, rules document not seeded yet".to_string(),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("document store read failed: {error}"),
        },
    }
}
