//! Relay config loader (strict parsing, env overrides, then validation).

pub mod schema;

use std::fs;

use roomer_core::error::{RelayError, Result};

pub use schema::{
    BackoffSection, BackoffStrategy, ChatSection, CorrelationSection, DispatchSection, OpsSection,
    RelayConfig, RetryOn,
};

/// Env var naming the config file when no CLI argument is given.
pub const CONFIG_PATH_ENV: &str = "ROOMER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "roomer.yaml";

pub fn load_from_file(path: &str) -> Result<RelayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("read {path} failed: {e}")))?;
    load_with(&s, |key| std::env::var(key).ok())
}

/// Parse and validate without consulting the environment.
pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    load_with(s, |_| None)
}

/// Parse, apply overrides from `lookup`, then validate.
pub fn load_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<RelayConfig> {
    let mut cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| RelayError::Config(format!("invalid yaml: {e}")))?;
    cfg.apply_overrides(lookup);
    cfg.validate()?;
    Ok(cfg)
}
