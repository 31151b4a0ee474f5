//! Configuration module

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::ModelSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listening port
    pub port: u16,

    /// Maximum request body size in bytes
    pub body_limit_bytes: usize,

    /// Frozen graph location on disk
    pub model_path: PathBuf,

    /// Where to fetch the model from when `model_path` is missing
    pub model_url: Option<String>,

    pub model: ModelSpec,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let body_limit_mb: usize = parse_var(&lookup, "BODY_LIMIT_MB", "integer", 5)?;

        Ok(Config {
            port: parse_var(&lookup, "PORT", "port number", 5000)?,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| "./model/frozen_graph.pb".into())
                .into(),
            model_url: lookup("MODEL_URL").filter(|url| !url.is_empty()),
            model: ModelSpec {
                input_op: lookup("MODEL_INPUT_OP").unwrap_or_else(|| "x".into()),
                output_op: lookup("MODEL_OUTPUT_OP").unwrap_or_else(|| "Identity".into()),
                input_size: parse_var(&lookup, "MODEL_INPUT_SIZE", "image size", 224)?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
