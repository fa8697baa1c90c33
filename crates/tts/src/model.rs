pub mod command;

use std::{path::PathBuf, process::ExitStatus, sync::Arc};

use soprano_config::{ModelConfig, ModelType};
use thiserror::Error;

use self::command::CommandModel;

/// A loaded text-to-speech engine
///
/// Inference is synchronous and CPU-bound. Implementations are shared
/// read-only between concurrent requests, so `infer` takes `&self`.
pub trait SpeechModel: Send + Sync {
    /// Model identifier for logs and metrics
    fn name(&self) -> &str;

    /// Sample rate of the audio returned by [`SpeechModel::infer`], in Hz
    fn sample_rate(&self) -> u32;

    /// Convert text into mono samples in `[-1.0, 1.0]`
    fn infer(&self, text: &str) -> Result<Vec<f32>, InferenceError>;
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to start synthesizer: {0}")]
    Spawn(std::io::Error),

    #[error("synthesizer I/O failed: {0}")]
    Io(std::io::Error),

    #[error("synthesizer exited with {status}: {stderr}")]
    Exited { status: ExitStatus, stderr: String },

    #[error("synthesizer produced {len} bytes, not a whole number of {width}-byte samples")]
    TruncatedOutput { len: usize, width: usize },

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("synthesizer program '{0}' was not found")]
    ProgramNotFound(String),

    #[error("model file {} does not exist", .0.display())]
    MissingModelFile(PathBuf),

    #[error("model type '{0}' requires a [model.{0}] section")]
    MissingSettings(&'static str),
}

/// Construct the configured model
///
/// # Errors
///
/// Returns an error when the backend cannot be brought up; the caller
/// decides whether that is fatal.
pub fn load(config: &ModelConfig) -> Result<Arc<dyn SpeechModel>, LoadError> {
    match config.model_type {
        ModelType::Command => {
            let settings = config.command.as_ref().ok_or(LoadError::MissingSettings("command"))?;
            let model = CommandModel::load(&config.name, config.sample_rate, settings)?;
            Ok(Arc::new(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_failures_are_reported_once() {
        let spawn = InferenceError::Spawn(std::io::Error::other("permission denied"));
        assert_eq!(spawn.to_string(), "failed to start synthesizer: permission denied");
        assert!(spawn.source().is_none());

        let io = InferenceError::Io(std::io::Error::other("broken pipe"));
        assert_eq!(io.to_string(), "synthesizer I/O failed: broken pipe");
        assert!(io.source().is_none());
    }
}
