use std::path::Path;

use crate::{Config, ModelType};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the model section is incomplete or out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_model_config()?;
        self.validate_health_config()?;
        Ok(())
    }

    fn validate_model_config(&self) -> anyhow::Result<()> {
        let Some(ref model) = self.model else {
            return Ok(());
        };

        if model.sample_rate == 0 {
            anyhow::bail!("model.sample_rate must be greater than 0");
        }

        if model.max_concurrency == Some(0) {
            anyhow::bail!("model.max_concurrency must be greater than 0 when set");
        }

        match model.model_type {
            ModelType::Command => {
                let Some(ref command) = model.command else {
                    anyhow::bail!("model type 'command' requires a [model.command] section");
                };

                if command.program.trim().is_empty() {
                    anyhow::bail!("model.command.program must not be empty");
                }
            }
        }

        Ok(())
    }

    fn validate_health_config(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if !health.enabled {
            return Ok(());
        }

        for path in [&health.path, &health.readiness_path] {
            if !path.starts_with('/') {
                anyhow::bail!("health endpoint path '{path}' must start with '/'");
            }
        }

        if health.path == health.readiness_path {
            anyhow::bail!("health and readiness endpoints must use different paths");
        }

        Ok(())
    }
}
