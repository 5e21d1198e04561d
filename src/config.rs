//! Application configuration, loaded the way the teacher platform loads its
//! `AppConfig`: code defaults, an optional `Settings.toml`, an optional
//! per-`RUN_MODE` override file, then environment variables win.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Runtime configuration for the `pcb-host` binary.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PcbHostConfig {
    /// Socket address the HTTP surface binds to, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,

    /// Directory capture files and summary logs are written under.
    pub log_dir: String,

    /// Minimum `tracing` level emitted by the binary (`error`..`trace`).
    pub log_level: String,

    /// Name of the environment variable read at startup to perform the
    /// one-shot default-process initialization described in `spec.md` §6.
    pub init_process_env_var: String,
}

impl Default for PcbHostConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_dir: "/tmp/pcb_logs".to_string(),
            log_level: "info".to_string(),
            init_process_env_var: "PCB_HOST_INIT_PROCESS".to_string(),
        }
    }
}

impl PcbHostConfig {
    /// Loads configuration from defaults, `Settings.toml`,
    /// `Settings.<RUN_MODE>.toml`, and `PCB_HOST__*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = Self::default();

        let builder = Config::builder()
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("log_dir", defaults.log_dir)?
            .set_default("log_level", defaults.log_level)?
            .set_default("init_process_env_var", defaults.init_process_env_var)?
            .add_source(File::with_name("Settings").required(false))
            .add_source(File::with_name(&format!("Settings.{run_mode}")).required(false))
            .add_source(Environment::with_prefix("PCB_HOST").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// Validates field constraints not expressible as `config` defaults.
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_addr.is_empty() {
            return Err("bind_addr must not be empty".into());
        }
        if self.log_dir.is_empty() {
            return Err("log_dir must not be empty".into());
        }
        Ok(())
    }
}
