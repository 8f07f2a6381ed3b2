use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/haptics/test: play the configured test sequence.
pub async fn test(State(app): State<AppState>) -> Result<(StatusCode, Json<Value>), AppError> {
    app.session.test_haptics()?;
    let haptics = &app.config.haptics;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "strength": haptics.strength,
            "count": haptics.count.clamp(1, 4),
        })),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayBody {
    pub pattern_id: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// POST /api/haptics/play: trigger a catalog pattern. Unknown ids play the
/// default pulse; the response names what will actually play.
pub async fn play(
    State(app): State<AppState>,
    Json(body): Json<PlayBody>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if body.pattern_id.trim().is_empty() {
        return Err(AppError::bad_request("patternId must not be empty"));
    }
    let resolved = app
        .catalog
        .resolve(&body.pattern_id, body.variant.as_deref());
    app.session.trigger(body.pattern_id, body.variant)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "pattern": resolved.id(),
            "pulses": resolved.pulses(),
        })),
    ))
}
