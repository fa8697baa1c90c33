use serde::Deserialize;

/// Liveness and readiness endpoint configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Liveness path, answers while the process is up
    #[serde(default = "default_path")]
    pub path: String,
    /// Readiness path, answers `503` until a model is loaded
    #[serde(default = "default_readiness_path")]
    pub readiness_path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_path(),
            readiness_path: default_readiness_path(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_path() -> String {
    "/health".to_string()
}

fn default_readiness_path() -> String {
    "/ready".to_string()
}
