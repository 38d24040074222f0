//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::config::Config;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.any_origin() {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    cors.allow_origin(allowed_origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    seated_players: usize,
    connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state))
}

fn health(state: &AppState) -> HealthResponse {
    HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.room_registry.len(),
        seated_players: state.room_registry.seated(),
        connections: state.hub.len(),
    }
}
