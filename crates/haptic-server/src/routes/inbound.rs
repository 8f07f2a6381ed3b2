use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/inbound/direct: deliver a message as if it arrived directly
/// and return its acknowledgment.
pub async fn direct(
    State(app): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let ack = app.session.inbound_direct(payload).await?;
    Ok(Json(ack))
}

/// POST /api/inbound/durable: deliver a message as a context update. No ack.
pub async fn durable(
    State(app): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, AppError> {
    app.session.inbound_durable(payload)?;
    Ok(StatusCode::ACCEPTED)
}
