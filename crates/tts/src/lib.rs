#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod encode;
mod error;
mod format;
pub mod model;
mod request;
mod server;
mod types;

use std::sync::Arc;

use axum::{Router, extract::State, routing::post};

pub use error::{Result, TtsError};
pub use format::{AudioFormat, ResolvedFormat};
pub use model::{InferenceError, LoadError, SpeechModel};
pub use server::{Server, TtsServerBuilder};
pub use types::{AUDIO_DURATION_HEADER, FORMAT_FALLBACK_HEADER, SAMPLE_RATE_HEADER, SpeechRequest, SpeechResponse};
use request::JsonPayload;

/// Build the TTS server from configuration
///
/// Model construction fails soft: the returned server is always usable,
/// and reports `503` for synthesis when no model could be loaded.
pub fn build_server(config: &soprano_config::Config) -> Arc<Server> {
    Arc::new(TtsServerBuilder::new(config).build())
}

/// Create the endpoint router for TTS
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/v1/audio/speech", post(synthesize))
}

/// Handle speech synthesis requests
async fn synthesize(
    State(server): State<Arc<Server>>,
    JsonPayload(request): JsonPayload<SpeechRequest>,
) -> Result<axum::response::Response> {
    tracing::debug!(
        model = %request.model(),
        voice = %request.voice(),
        chars = request.input.chars().count(),
        "TTS speech handler called"
    );

    let response = server.synthesize(request).await?;

    Ok(response.into_response())
}
