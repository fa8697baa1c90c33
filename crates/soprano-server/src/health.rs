use std::sync::Arc;

use axum::{extract::State, response::IntoResponse};
use http::StatusCode;

/// Liveness handler, answers while the process is up
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness handler, answers `503` when no speech model was loaded
pub async fn readiness_handler(State(tts): State<Arc<tts::Server>>) -> impl IntoResponse {
    if tts.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "model unavailable")
    }
}
