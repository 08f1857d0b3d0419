//! The progress bridge: forwards a job's hub events to one WebSocket
//! client.
//!
//! Authorization runs synchronously before the upgrade, on every
//! subscribe: the caller must present a valid token for the job's
//! owner or the connection is refused before any subscription exists.
//! Delivery is best-effort -- a client that connects late or lags
//! simply misses events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use feedframe_core::error::CoreError;
use feedframe_core::types::DbId;
use feedframe_db::repositories::JobRepo;
use feedframe_events::{ProgressEvent, ProgressHub};

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters for the progress endpoint. Browsers cannot set
/// headers on WebSocket connects, so the token may arrive as `?token=`.
#[derive(Debug, Deserialize)]
pub struct ProgressParams {
    pub token: Option<String>,
}

/// GET /api/v1/jobs/{id}/progress
///
/// Upgrade to a WebSocket streaming the job's progress events as JSON
/// text frames. Refused (401/403/404) before the upgrade when the
/// token is invalid or the principal does not own the job.
pub async fn progress_handler(
    ws: WebSocketUpgrade,
    Path(job_id): Path<DbId>,
    Query(params): Query<ProgressParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let token = bearer_token(&headers)
        .or(params.token.as_deref())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing access token".into()))
        })?;

    let claims = validate_token(token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    // Ownership is re-checked on every subscribe, never cached.
    let job = JobRepo::find_by_id(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;
    if job.owner_id != claims.sub {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot observe another user's job".into(),
        )));
    }

    let hub = Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| bridge(socket, hub, job_id)))
}

/// Extract a `Bearer` token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Forward hub events for `job_id` to the socket until either side
/// disconnects. Dropping the receiver on exit removes the subscription.
async fn bridge(socket: WebSocket, hub: Arc<ProgressHub>, job_id: DbId) {
    tracing::info!(job_id, "Progress subscriber connected");

    let mut rx = hub.subscribe(job_id).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if !forward(&mut sink, job_id, event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    // Best-effort delivery: skip what we missed.
                    tracing::warn!(job_id, missed, "Progress subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(job_id, error = %e, "WebSocket receive error");
                    break;
                }
                // Inbound frames carry nothing; the channel is one-way.
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(job_id, "Progress subscriber disconnected");
}

/// Serialize and send one event. The single dispatch point for both
/// event shapes; returns `false` once the sink is gone.
async fn forward(
    sink: &mut (impl futures::Sink<Message> + Unpin),
    job_id: DbId,
    event: ProgressEvent,
) -> bool {
    match &event {
        ProgressEvent::Entry {
            processed, total, ..
        } => {
            tracing::debug!(job_id, processed, total, "Forwarding progress event");
        }
        ProgressEvent::Error { error } => {
            tracing::warn!(job_id, error = %error, "Forwarding fatal error event");
        }
    }

    let Ok(payload) = serde_json::to_string(&event) else {
        tracing::error!(job_id, "Failed to serialize progress event");
        return true;
    };

    sink.send(Message::Text(payload.into())).await.is_ok()
}
