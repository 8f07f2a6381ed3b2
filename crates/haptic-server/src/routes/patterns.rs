use axum::extract::State;
use axum::Json;
use haptic_core::PatternSummary;

use crate::state::AppState;

/// GET /api/patterns: the built-in catalog, in catalog order.
pub async fn list_patterns(State(app): State<AppState>) -> Json<Vec<PatternSummary>> {
    Json(app.catalog.summaries())
}
