use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use peer_link::OutboxEntry;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/send: hand a payload to the transport.
pub async fn send(
    State(app): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, AppError> {
    app.session.send(payload)?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/outbox: the most recent send attempts, once in-flight sends settle.
pub async fn outbox(State(app): State<AppState>) -> Result<Json<Vec<OutboxEntry>>, AppError> {
    app.session.flush().await?;
    app.session.transport().idle().await;
    Ok(Json(app.connectivity.outbox()))
}
