use axum::extract::State;
use axum::Json;
use haptic_core::PresentationSnapshot;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReachabilityBody {
    pub reachable: bool,
}

#[derive(Deserialize)]
pub struct ActivationBody {
    pub activated: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// POST /api/link/reachability
pub async fn reachability(
    State(app): State<AppState>,
    Json(body): Json<ReachabilityBody>,
) -> Result<Json<PresentationSnapshot>, AppError> {
    app.connectivity.set_reachable(body.reachable);
    app.session.reachability_changed(body.reachable)?;
    app.session.flush().await?;
    Ok(Json(app.session.snapshot()))
}

/// POST /api/link/activation
pub async fn activation(
    State(app): State<AppState>,
    Json(body): Json<ActivationBody>,
) -> Result<Json<PresentationSnapshot>, AppError> {
    app.session.activation_complete(body.activated, body.error)?;
    app.session.flush().await?;
    Ok(Json(app.session.snapshot()))
}
