pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use haptic_core::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Presentation
        .route("/api/state", get(routes::state::get_state))
        .route("/api/events", get(routes::events::sse_events))
        .route("/api/patterns", get(routes::patterns::list_patterns))
        // Inbound transport events
        .route("/api/inbound/direct", post(routes::inbound::direct))
        .route("/api/inbound/durable", post(routes::inbound::durable))
        .route("/api/link/reachability", post(routes::link::reachability))
        .route("/api/link/activation", post(routes::link::activation))
        // Haptics
        .route("/api/haptics/test", post(routes::haptics::test))
        .route("/api/haptics/play", post(routes::haptics::play))
        // Outbound
        .route("/api/send", post(routes::outbound::send))
        .route("/api/outbox", get(routes::outbound::outbox))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the server on `0.0.0.0:{port}`.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Start the server on a pre-bound listener, so the caller can read the
/// actual port first when binding port 0.
pub async fn serve_on(config: Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(AppState::new(config)?);

    tracing::info!("haptic session server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
