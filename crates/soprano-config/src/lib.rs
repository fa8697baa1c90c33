#![allow(clippy::must_use_candidate)]

mod env;
pub mod health;
mod loader;
pub mod model;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use health::*;
pub use model::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level gateway configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Speech model configuration
    ///
    /// When absent the gateway still starts, but every synthesis request
    /// is answered with `503 Service Unavailable`.
    #[serde(default)]
    pub model: Option<ModelConfig>,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
