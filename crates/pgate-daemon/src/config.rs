//! Application configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file
//! 3. Environment variables prefixed `PGATE__`, nested with `__`
//!    (e.g. `PGATE__POLICY__KILL_SWITCH=true`)

use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pgate_api::ServerConfig;
use pgate_core::PolicyConfig;

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PGATE_CONFIG";

/// Config file used when neither `--config` nor `PGATE_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const ENV_PREFIX: &str = "PGATE";
const ENV_SEPARATOR: &str = "__";

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Load from `path` with environment overrides, then validate.
    ///
    /// A missing file is an error when `required`, otherwise defaults are used.
    pub fn load(path: &str, required: bool) -> AppResult<Self> {
        Self::load_with_env(path, required, Self::environment())
    }

    /// Same as [`AppConfig::load`] with an explicit environment source.
    pub fn load_with_env(path: &str, required: bool, env: Environment) -> AppResult<Self> {
        let mut builder = Config::builder();

        if Path::new(path).exists() {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if required {
            return Err(AppError::Config(format!("Config file not found: {path}")));
        } else {
            warn!(path = %path, "Config file not found, using defaults");
        }

        let config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;

        info!(
            host = %config.server.host,
            port = config.server.port,
            dry_run = config.server.dry_run,
            kill_switch = config.policy.kill_switch,
            rate_per_sec = config.policy.limits.effective_rate_per_sec(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml(raw: &str) -> AppResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// `PGATE__SECTION__KEY` overrides.
    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    /// Reject configurations the server could not run with.
    ///
    /// Policy limits always load: non-positive values mean default or disabled.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host must not be empty".to_string()));
        }
        Ok(())
    }
}
