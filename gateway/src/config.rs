//! Host configuration
//!
//! Read once at startup from environment variables:
//!
//! | Variable              | Default | Meaning                                  |
//! |-----------------------|---------|------------------------------------------|
//! | `RELAY_LOG_LEVEL`     | `info`  | filter used when `RUST_LOG` is unset     |
//! | `RELAY_LOG_FORMAT`    | `pretty`| `pretty` or `json`                       |
//! | `RELAY_OUTPUT`        | `nats`  | output type name in the registry         |
//! | `RELAY_OUTPUT_CONFIG` | `{}`    | JSON object handed to the output factory |

use crate::error::{RelayError, Result};
use std::str::FromStr;

pub const ENV_LOG_LEVEL: &str = "RELAY_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "RELAY_LOG_FORMAT";
pub const ENV_OUTPUT: &str = "RELAY_OUTPUT";
pub const ENV_OUTPUT_CONFIG: &str = "RELAY_OUTPUT_CONFIG";

/// Log line rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(RelayError::Config(format!("unknown log format: {other}"))),
        }
    }
}

/// Relay host configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Output type name
    pub output: String,
    /// Raw output settings
    pub output_config: serde_json::Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            output: "nats".to_string(),
            output_config: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl Config {
    /// Read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`; unset and empty variables keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        if let Some(format) = get(ENV_LOG_FORMAT) {
            config.log_format = format.parse()?;
        }

        if let Some(output) = get(ENV_OUTPUT) {
            config.output = output;
        }

        if let Some(raw) = get(ENV_OUTPUT_CONFIG) {
            let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                RelayError::Config(format!("{ENV_OUTPUT_CONFIG} is not valid JSON: {e}"))
            })?;
            if !value.is_object() {
                return Err(RelayError::Config(format!(
                    "{ENV_OUTPUT_CONFIG} must be a JSON object"
                )));
            }
            config.output_config = value;
        }

        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.output, "nats");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_all_variables() {
        let config = Config::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FORMAT, "JSON"),
            (ENV_OUTPUT, "stdout"),
            (ENV_OUTPUT_CONFIG, r#"{"format":"json"}"#),
        ]))
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.output, "stdout");
        assert_eq!(config.output_config["format"], "json");
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = Config::from_lookup(lookup(&[(ENV_OUTPUT, "  "), (ENV_LOG_LEVEL, "")])).unwrap();
        assert_eq!(config.output, "nats");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));

        let err = Config::from_lookup(lookup(&[(ENV_OUTPUT_CONFIG, "{nope")])).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));

        let err = Config::from_lookup(lookup(&[(ENV_OUTPUT_CONFIG, "[1]")])).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
