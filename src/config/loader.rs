//! Configuration Loader
//!
//! Merges defaults, an optional TOML file and environment variables into an
//! [`OrchestratorConfig`], then validates the result.

use super::error::ConfigResult;
use super::OrchestratorConfig;
use crate::constants::env;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable prefix for overrides, e.g.
/// `ORCHESTRATOR__HEALTH__PING_INTERVAL_MS=5000`
pub const ENV_PREFIX: &str = "ORCHESTRATOR";

const DEFAULT_CONFIG_PATH: &str = "config/orchestrator.toml";

/// Builder-style loader around the `config` crate
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_environment: bool,
    env_overrides: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading `config/orchestrator.toml` (if present) and the process environment
    pub fn new() -> Self {
        Self {
            file: Some(PathBuf::from(DEFAULT_CONFIG_PATH)),
            use_environment: true,
            env_overrides: None,
        }
    }

    /// Read configuration from a specific file instead of the default location
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip file loading entirely
    pub fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    /// Skip environment variable overrides
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    /// Use an explicit variable map instead of the process environment.
    /// Keys carry the full prefix, as they would in the real environment.
    pub fn with_env_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.use_environment = true;
        self.env_overrides = Some(vars);
        self
    }

    /// Load, merge and validate
    pub fn load(&self) -> ConfigResult<OrchestratorConfig> {
        let environment = detect_environment();
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            debug!(path = %path.display(), "Loading orchestrator configuration file");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if self.use_environment {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env_overrides.clone()),
            );
        }

        let config: OrchestratorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            ping_interval_ms = config.health.ping_interval_ms,
            default_timeout_ms = config.bus.default_timeout_ms,
            "⚙️ Orchestrator configuration loaded"
        );

        Ok(config)
    }
}

/// Get current environment from environment variables
pub fn detect_environment() -> String {
    std::env::var(env::ORCHESTRATOR_ENV)
        .or_else(|_| std::env::var(env::APP_ENV))
        .unwrap_or_else(|_| env::DEFAULT_ENVIRONMENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = ConfigLoader::new()
            .without_file()
            .without_environment()
            .load()
            .unwrap();
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[health]\nping_interval_ms = 1500\n\n[bus]\nmailbox_capacity = 8"
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .without_environment()
            .load()
            .unwrap();

        assert_eq!(config.health.ping_interval_ms, 1500);
        assert_eq!(config.bus.mailbox_capacity, 8);
        // untouched values keep their defaults
        assert_eq!(config.bus.default_timeout_ms, 30_000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[health]\nping_interval_ms = 1500").unwrap();

        let mut vars = HashMap::new();
        vars.insert(
            "ORCHESTRATOR__HEALTH__PING_INTERVAL_MS".to_string(),
            "250".to_string(),
        );

        let config = ConfigLoader::new()
            .with_file(file.path())
            .with_env_overrides(vars)
            .load()
            .unwrap();

        assert_eq!(config.health.ping_interval_ms, 250);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut vars = HashMap::new();
        vars.insert(
            "ORCHESTRATOR__BUS__MAILBOX_CAPACITY".to_string(),
            "0".to_string(),
        );

        let result = ConfigLoader::new()
            .without_file()
            .with_env_overrides(vars)
            .load();
        assert!(result.is_err());
    }
}
