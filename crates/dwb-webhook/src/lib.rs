//! Inbound webhook surface (axum).
//!
//! The HTTP boundary only authenticates and decodes: a valid update is
//! pushed onto a channel and the bot side drains it. No bot logic lives
//! here.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use teloxide::types::Update;
use tokio::sync::mpsc::UnboundedSender;

use dwb_core::{errors::Error, Result};

#[derive(Clone)]
struct WebhookState {
    secret: Arc<String>,
    updates: UnboundedSender<Update>,
}

/// Build the webhook router.
///
/// - `GET /` — liveness probe.
/// - `POST /webhook/{token}` — Telegram update intake; `token` must equal
///   the configured webhook secret or the request is rejected with 401 and
///   nothing is dispatched.
pub fn router(secret: String, updates: UnboundedSender<Update>) -> Router {
    let state = WebhookState {
        secret: Arc::new(secret),
        updates,
    };

    Router::new()
        .route("/", get(liveness))
        .route("/webhook/{token}", post(receive_update))
        .with_state(state)
}

/// Bind and serve the webhook router until the process exits.
pub async fn serve(
    addr: SocketAddr,
    secret: String,
    updates: UnboundedSender<Update>,
) -> Result<()> {
    let app = router(secret, updates);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::External(format!("webhook bind {addr}: {e}")))?;

    tracing::info!("webhook listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::External(format!("webhook server: {e}")))
}

async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Diskwala bot is live" }))
}

async fn receive_update(
    State(state): State<WebhookState>,
    Path(token): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if token != *state.secret {
        tracing::warn!("webhook request with wrong token rejected");
        return status_reply(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let update = match serde_json::from_value::<Update>(body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("undecodable webhook update: {e}");
            return status_reply(StatusCode::BAD_REQUEST, "bad_request");
        }
    };

    if state.updates.send(update).is_err() {
        // Receiver gone: the bot side is shutting down.
        return status_reply(StatusCode::SERVICE_UNAVAILABLE, "shutting_down");
    }

    status_reply(StatusCode::OK, "ok")
}

fn status_reply(code: StatusCode, status: &str) -> Response {
    (code, Json(serde_json::json!({ "status": status }))).into_response()
}
