use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE stream that emits `update` with the full snapshot
/// whenever it changes. The first event carries the current snapshot.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let stream = WatchStream::new(app.session.subscribe())
        .map(|snapshot| Event::default().event("update").json_data(snapshot));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
