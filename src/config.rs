//! Engine configuration
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Config file (`action.toml` in the working directory, or an explicit path)
//! 3. `.env` file, loaded into the process environment
//! 4. Environment variables prefixed `ACTION__`, e.g. `ACTION__ENGINE__MAX_STEPS=500`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default config file stem searched in the working directory
const DEFAULT_CONFIG_NAME: &str = "action";

/// Environment variable prefix
const ENV_PREFIX: &str = "ACTION";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub log: LogConfig,
}

/// What happens to the remaining sequences once one fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceErrorPolicy {
    #[default]
    Halt,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on blocks (per sequence) and sequences (per action) run in one dispatch
    pub max_steps: usize,

    /// How deep `action/dispatch` may nest
    pub max_dispatch_depth: usize,

    pub on_sequence_error: SequenceErrorPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_dispatch_depth: 16,
            on_sequence_error: SequenceErrorPolicy::Halt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default locations
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    /// Parse a TOML document on top of the defaults, ignoring the environment
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse config")
    }

    /// Render the effective configuration
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render config")
    }
}

/// Builder for loading a `Config`
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Read this file instead of searching for `action.toml`
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Ignore `.env` and `ACTION__*` variables
    pub fn skip_env(mut self, skip: bool) -> Self {
        self.skip_env = skip;
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut builder = config::Config::builder();

        builder = match &self.config_path {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        if !self.skip_env {
            // A missing .env file is fine
            let _ = dotenvy::dotenv();
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings = builder.build().context("Failed to load configuration")?;
        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
