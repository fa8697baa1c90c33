use std::path::PathBuf;

use serde::Deserialize;

/// Speech model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Backend type
    #[serde(rename = "type")]
    pub model_type: ModelType,
    /// Model identifier reported in logs and metrics
    #[serde(default = "default_name")]
    pub name: String,
    /// Sample rate of the audio the model produces, in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Device the model runs on
    #[serde(default)]
    pub device: Device,
    /// Maximum number of inference calls running at once
    ///
    /// Unlimited when unset.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    /// Settings for the `command` backend
    #[serde(default)]
    pub command: Option<CommandModelConfig>,
}

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// External synthesizer program, fed text on stdin
    Command,
}

/// Inference device
///
/// Only CPU inference is available; any other value is rejected at load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
}

/// External synthesizer process settings
///
/// The program receives the input text on stdin and must write mono
/// little-endian samples to stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandModelConfig {
    /// Executable name or path
    pub program: String,
    /// Extra arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Model weights that must exist before the model is considered loaded
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Layout of the samples on stdout
    #[serde(default)]
    pub sample_encoding: SampleEncoding,
}

/// Raw sample layout produced by a synthesizer process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    /// Signed 16-bit little-endian
    #[default]
    S16le,
    /// 32-bit float little-endian
    F32le,
}

impl SampleEncoding {
    /// Bytes per sample
    pub const fn width(self) -> usize {
        match self {
            Self::S16le => 2,
            Self::F32le => 4,
        }
    }
}

fn default_name() -> String {
    "soprano-80m".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_sample_rate() -> u32 {
    32_000
}
