//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use soprano_config::{
    CommandModelConfig, Config, Device, HealthConfig, ModelConfig, ModelType, SampleEncoding, ServerConfig,
};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults and no model
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                },
                model: None,
                telemetry: None,
            },
        }
    }

    /// Use an external synthesizer process as the model
    pub fn with_command_model(mut self, program: &str, args: &[&str], encoding: SampleEncoding) -> Self {
        self.config.model = Some(ModelConfig {
            model_type: ModelType::Command,
            name: "soprano-80m".to_owned(),
            sample_rate: 32_000,
            device: Device::Cpu,
            max_concurrency: None,
            command: Some(CommandModelConfig {
                program: program.to_owned(),
                args: args.iter().map(|arg| (*arg).to_owned()).collect(),
                model_path: None,
                sample_encoding: encoding,
            }),
        });
        self
    }

    /// Disable health and readiness endpoints
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
