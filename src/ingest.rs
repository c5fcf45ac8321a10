//! HTTP ingestion endpoint.
//!
//! Walks each `/webhook` request through validate → authenticate → log →
//! dispatch and maps the aggregated delivery result to the HTTP response.
//! Only validation and authentication may short-circuit; everything after
//! authentication runs to completion and is absorbed into the response
//! according to the masking policy.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};
use subtle::ConstantTimeEq;

use crate::channels::{AggregatedResult, DeliveryCoordinator, Overall};
use crate::config::Config;
use crate::error::IngestError;
use crate::message::{self, Message};
use crate::sink::LogSink;
use crate::viewer::ViewerHandle;

/// Shared state for the ingestion routes. Read-only per request apart from
/// the serialized sink and the viewer queue.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sink: Arc<LogSink>,
    pub viewer: Option<ViewerHandle>,
    pub coordinator: Arc<DeliveryCoordinator>,
}

/// Build the `/webhook` route fragment with its state applied.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(webhook_get).post(webhook_post))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct WebhookQuery {
    api_key: Option<String>,
    message: Option<String>,
    text_from: Option<String>,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match self {
            IngestError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn webhook_get(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
) -> Response {
    // Validation precedes authentication (observed request order).
    let Some(raw) = query.message.clone() else {
        return IngestError::MissingMessage.into_response();
    };
    handle(state, Value::String(raw), query).await
}

async fn webhook_post(
    State(state): State<AppState>,
    Query(mut query): Query<WebhookQuery>,
    body: String,
) -> Response {
    let parsed: Value = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(_) => return IngestError::MalformedBody.into_response(),
    };
    let Some(obj) = parsed.as_object() else {
        return IngestError::MissingBodyMessage.into_response();
    };
    // Key presence, not value truthiness: `null` is a valid message value.
    let Some(raw) = obj.get("message").cloned() else {
        return IngestError::MissingBodyMessage.into_response();
    };

    // Sender label: a non-empty query parameter wins over the body field.
    if query.text_from.as_deref().is_none_or(str::is_empty) {
        query.text_from = obj.get("text_from").and_then(sender_label);
    }
    handle(state, raw, query).await
}

/// Extract a usable sender label from a body `text_from` value. Scalars are
/// stringified; empty strings, null, and structured values fall through to
/// the default label.
fn sender_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Shared pipeline once the message value has been extracted.
async fn handle(state: AppState, raw: Value, query: WebhookQuery) -> Response {
    if !api_key_matches(query.api_key.as_deref(), &state.config.security.api_key) {
        return IngestError::InvalidApiKey.into_response();
    }

    let received_at = Local::now();
    let original = message::original_text(&raw);
    // An empty label falls back to the default, matching the original's
    // `text_from or default` chain.
    let msg = Message::new(&raw, query.text_from.filter(|s| !s.is_empty()), received_at);

    // Log-then-deliver: the durable append is attempted before any
    // dispatch begins.
    if let Err(e) = state.sink.append(&original, received_at).await {
        tracing::error!(error = %e, "Durable log append failed");
        if !state.config.relay.mask_internal_errors {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to record message" })),
            )
                .into_response();
        }
        // Masked policy: the fault is absorbed and the request continues.
    }

    if let Some(viewer) = &state.viewer {
        viewer.show(msg.text.clone(), msg.sender_label.clone(), received_at);
    }

    let result = state.coordinator.dispatch(&msg).await;
    respond(&state, &result)
}

/// Constant-time comparison of the caller-supplied key with the secret.
fn api_key_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(provided) => bool::from(provided.as_bytes().ct_eq(expected.as_bytes())),
        None => false,
    }
}

/// Map the aggregated result to 200 (all succeeded) or 207 (at least one
/// channel failed), always with the per-channel detail map.
fn respond(state: &AppState, result: &AggregatedResult) -> Response {
    let mut details = serde_json::Map::new();
    let gui = if state.viewer.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    details.insert("gui".to_string(), json!(gui));
    for (name, outcome) in result.outcomes() {
        details.insert((*name).to_string(), json!(outcome.status_word()));
    }

    match result.overall() {
        Overall::AllSucceeded => (
            StatusCode::OK,
            Json(json!({ "status": "success", "details": details })),
        )
            .into_response(),
        Overall::PartialFailure => (
            StatusCode::MULTI_STATUS,
            Json(json!({ "status": "partial_failure", "details": details })),
        )
            .into_response(),
    }
}
