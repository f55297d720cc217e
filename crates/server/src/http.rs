//! Inbound message endpoint.
//!
//! `POST /api/messages` is the single ingress for channel traffic. The
//! transport contract is deliberately flat: non-JSON content types are
//! refused with 415 before the body is touched, bodies that do not parse as
//! an activity get 400, and everything that reaches the turn pipeline
//! answers 200 regardless of how the turn itself went (turn failures surface
//! to the user as replies, not as transport errors).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use bibliobot_channel::{Activity, ChannelAdapter};
use tracing::debug;

#[derive(Clone)]
pub struct MessagesState {
    adapter: Arc<ChannelAdapter>,
}

pub fn router(adapter: Arc<ChannelAdapter>) -> Router {
    Router::new()
        .route("/api/messages", post(messages))
        .with_state(MessagesState { adapter })
}

async fn messages(
    State(state): State<MessagesState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !content_type.contains("application/json") {
        debug!(
            event_name = "ingress.unsupported_media_type",
            content_type,
            "rejecting non-JSON request body"
        );
        return StatusCode::UNSUPPORTED_MEDIA_TYPE;
    }

    let activity: Activity = match serde_json::from_slice(&body) {
        Ok(activity) => activity,
        Err(error) => {
            debug!(
                event_name = "ingress.malformed_activity",
                error = %error,
                "rejecting body that does not parse as an activity"
            );
            return StatusCode::BAD_REQUEST;
        }
    };

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.adapter.process_activity(&activity, auth_header).await;
    StatusCode::OK
}
