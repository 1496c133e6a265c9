// Configuration for the dispatch core

use crate::introspect::AmbiguityPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Environment variable selecting the [`AmbiguityPolicy`].
pub const AMBIGUITY_ENV: &str = "COURIER_AMBIGUITY";
/// Environment variable selecting the default [`ProviderKind`].
pub const PROVIDER_ENV: &str = "COURIER_INSTANCE_PROVIDER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Instance provider used when none is supplied explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Construct handlers on demand.
    #[default]
    Activator,
    /// Start from an empty local registry.
    Local,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "activator" => Some(Self::Activator),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Dispatch core settings.
///
/// ```toml
/// ambiguity = "first_declared"
/// instance_provider = "local"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CqrsConfig {
    pub ambiguity: AmbiguityPolicy,
    pub instance_provider: ProviderKind,
}

impl CqrsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `COURIER_AMBIGUITY` and `COURIER_INSTANCE_PROVIDER`; unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(AMBIGUITY_ENV) {
            config.ambiguity = AmbiguityPolicy::parse(&value).ok_or_else(|| invalid(AMBIGUITY_ENV, &value))?;
        }
        if let Some(value) = lookup(PROVIDER_ENV) {
            config.instance_provider =
                ProviderKind::parse(&value).ok_or_else(|| invalid(PROVIDER_ENV, &value))?;
        }

        Ok(config)
    }

    /// Read the same variables from a `.env` file without touching the
    /// process environment.
    pub fn from_dotenv(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let iter = dotenvy::from_path_iter(path.as_ref())
            .map_err(|e| ConfigError::LoadError(format!("Failed to read {}: {}", path.as_ref().display(), e)))?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::ParseError(e.to_string()))?;
            vars.insert(key, value);
        }

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
