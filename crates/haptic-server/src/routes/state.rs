use axum::extract::State;
use axum::Json;
use haptic_core::PresentationSnapshot;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/state: the presentation snapshot, after every event posted
/// before this request has been applied.
pub async fn get_state(
    State(app): State<AppState>,
) -> Result<Json<PresentationSnapshot>, AppError> {
    app.session.flush().await?;
    Ok(Json(app.session.snapshot()))
}
