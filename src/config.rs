//! Host configuration.
//!
//! Values come from CLI flags, falling back to the environment through
//! clap's `env` support. They arrive as raw strings and are validated here so
//! that a bad value is reported against the variable that carried it.
//!
//! - `ABSMOVE_SERVICE_URL`: document-editing service base URL
//! - `ABSMOVE_HISTORY_CAPACITY`: undo/redo history bound
//! - `ABSMOVE_CONNECT_TIMEOUT_SECS`: TCP connect timeout for the service

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use clap::Args;
use engine::consts::HISTORY_CAPACITY;
use engine::engine::EngineConfig;

pub const SERVICE_URL_VAR: &str = "ABSMOVE_SERVICE_URL";
pub const HISTORY_CAPACITY_VAR: &str = "ABSMOVE_HISTORY_CAPACITY";
pub const CONNECT_TIMEOUT_VAR: &str = "ABSMOVE_CONNECT_TIMEOUT_SECS";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got `{value}`")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be an http or https URL, got `{value}`")]
    InvalidUrl { var: &'static str, value: String },
}

/// Raw configuration flags.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Document-editing service base URL.
    #[arg(long, global = true, env = "ABSMOVE_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Maximum number of undo/redo entries kept.
    #[arg(long, global = true, env = "ABSMOVE_HISTORY_CAPACITY")]
    pub history_capacity: Option<String>,

    /// Connect timeout for the service, in seconds.
    #[arg(long, global = true, env = "ABSMOVE_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<String>,
}

/// Validated host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without a trailing slash.
    pub service_url: String,
    pub history_capacity: usize,
    /// Applies to connecting only; requests themselves are never timed out.
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: protocol::DEFAULT_SERVICE_URL.to_owned(),
            history_capacity: HISTORY_CAPACITY,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Validate raw flags, filling defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid variable.
    pub fn from_args(args: &ConfigArgs) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let service_url = match args.service_url.as_deref() {
            Some(raw) => parse_url(SERVICE_URL_VAR, raw)?,
            None => defaults.service_url,
        };
        let history_capacity = match args.history_capacity.as_deref() {
            Some(raw) => parse_positive(HISTORY_CAPACITY_VAR, raw)?,
            None => defaults.history_capacity,
        };
        let connect_timeout = match args.connect_timeout_secs.as_deref() {
            Some(raw) => Duration::from_secs(parse_positive(CONNECT_TIMEOUT_VAR, raw)?),
            None => defaults.connect_timeout,
        };
        Ok(Self { service_url, history_capacity, connect_timeout })
    }

    /// Engine tunables for this configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig { history_capacity: self.history_capacity, ..EngineConfig::default() }
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidUrl { var, value: raw.to_owned() };
    let url = reqwest::Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(raw.trim().trim_end_matches('/').to_owned())
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ConfigError::InvalidNumber { var, value: raw.to_owned() }),
    }
}
