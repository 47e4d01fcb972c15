use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = "tasks.json";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
const CONFIG_FILE: &str = "task-cli";
const ENV_PREFIX: &str = "TASK_CLI";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Location of the JSON task file.
    pub store_path: PathBuf,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Settings {
    /// Loads settings from `task-cli.toml` (optional) and `TASK_CLI_*`
    /// environment variables, on top of the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("store_path", DEFAULT_STORE_PATH)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)
    }
}
