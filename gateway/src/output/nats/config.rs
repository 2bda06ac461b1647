//! NATS output configuration
//!
//! Raw settings arrive as a loosely typed map from the host. They are decoded
//! into [`NatsConfig`] and then normalized, in one step, into an immutable
//! [`ResolvedConfig`] that every other component reads.

use crate::output::encode::OutputFormat;
use crate::output::subject::SubjectStrategy;
use relay_core::PluginError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Wait between dial attempts when none is configured
pub const DEFAULT_CONNECT_RETRY_WAIT: Duration = Duration::from_secs(2);

/// Prefix of generated connection names
pub const GENERATED_NAME_PREFIX: &str = "relay-";

/// Raw NATS output settings, keys as written in configuration files
///
/// Unknown keys are ignored. Every field is optional at this stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NatsConfig {
    pub name: String,
    pub address: String,
    pub subject_prefix: String,
    pub subject: String,
    pub username: String,
    pub password: String,
    /// Human readable, e.g. `"2s"` or `"500ms"`
    #[serde(with = "humantime_serde")]
    pub connect_time_wait: Option<Duration>,
    pub format: String,
}

impl NatsConfig {
    /// Decode raw settings; `null` yields all defaults
    pub fn from_value(raw: serde_json::Value) -> Result<Self, PluginError> {
        if raw.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(raw)
            .map_err(|e| PluginError::Config(format!("invalid nats output config: {e}")))
    }

    /// Apply defaults and validate
    ///
    /// Fails on an unsupported format or a missing address.
    pub fn normalize(self) -> Result<ResolvedConfig, PluginError> {
        let format: OutputFormat = self.format.parse()?;

        if self.address.is_empty() {
            return Err(PluginError::Config(
                "nats output requires an address".to_string(),
            ));
        }

        let name = if self.name.is_empty() {
            format!("{GENERATED_NAME_PREFIX}{}", ulid::Ulid::new())
        } else {
            self.name
        };

        let connect_retry_wait = match self.connect_time_wait {
            Some(wait) if !wait.is_zero() => wait,
            _ => DEFAULT_CONNECT_RETRY_WAIT,
        };

        let credentials = if !self.username.is_empty() && !self.password.is_empty() {
            Some(Credentials {
                username: self.username,
                password: self.password,
            })
        } else {
            None
        };

        Ok(ResolvedConfig {
            name,
            address: self.address,
            subject: SubjectStrategy::from_settings(&self.subject_prefix, &self.subject),
            credentials,
            connect_retry_wait,
            format,
        })
    }
}

/// Username/password pair, only present when both were configured
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fully resolved, immutable NATS output configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedConfig {
    /// Connection identity reported to the broker
    pub name: String,
    /// Broker address, e.g. `nats://localhost:4222`
    pub address: String,
    pub subject: SubjectStrategy,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
    /// Wait between dial attempts, also used as the reconnect delay
    #[serde(with = "humantime_serde")]
    pub connect_retry_wait: Duration,
    pub format: OutputFormat,
}

impl ResolvedConfig {
    /// Resolve raw settings in one go
    pub fn from_value(raw: serde_json::Value) -> Result<Self, PluginError> {
        NatsConfig::from_value(raw)?.normalize()
    }
}

/// JSON rendering for logs; credentials are never included
impl fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let config = ResolvedConfig::from_value(json!({ "address": "localhost:4222" })).unwrap();

        assert!(config.name.starts_with(GENERATED_NAME_PREFIX));
        assert!(config.name.len() > GENERATED_NAME_PREFIX.len());
        assert_eq!(config.connect_retry_wait, DEFAULT_CONNECT_RETRY_WAIT);
        assert_eq!(config.format, OutputFormat::Event);
        assert_eq!(
            config.subject,
            SubjectStrategy::Static(crate::output::subject::DEFAULT_SUBJECT.to_string())
        );
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_generated_names_are_unique() {
        let a = ResolvedConfig::from_value(json!({ "address": "x" })).unwrap();
        let b = ResolvedConfig::from_value(json!({ "address": "x" })).unwrap();
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn test_explicit_values_kept() {
        let config = ResolvedConfig::from_value(json!({
            "name": "collector-1",
            "address": "nats://broker:4222",
            "subject-prefix": "telemetry",
            "subject": "ignored",
            "connect-time-wait": "500ms",
            "format": "proto",
        }))
        .unwrap();

        assert_eq!(config.name, "collector-1");
        assert_eq!(config.address, "nats://broker:4222");
        assert_eq!(config.subject, SubjectStrategy::Prefix("telemetry".to_string()));
        assert_eq!(config.connect_retry_wait, Duration::from_millis(500));
        assert_eq!(config.format, OutputFormat::Proto);
    }

    #[test]
    fn test_zero_retry_wait_uses_default() {
        let config = ResolvedConfig::from_value(json!({
            "address": "x",
            "connect-time-wait": "0s",
        }))
        .unwrap();
        assert_eq!(config.connect_retry_wait, DEFAULT_CONNECT_RETRY_WAIT);
    }

    #[test]
    fn test_unsupported_format_is_config_error() {
        let err = ResolvedConfig::from_value(json!({
            "address": "x",
            "format": "xml",
        }))
        .unwrap_err();
        assert_eq!(
            err,
            PluginError::Config("unsupported output format: xml".to_string())
        );
    }

    #[test]
    fn test_missing_address_is_config_error() {
        let err = ResolvedConfig::from_value(json!({})).unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));

        let err = ResolvedConfig::from_value(serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));
    }

    #[test]
    fn test_undecodable_config_is_config_error() {
        let err = ResolvedConfig::from_value(json!({ "address": 4222 })).unwrap_err();
        assert!(matches!(err, PluginError::Config(msg) if msg.contains("invalid nats output config")));

        let err = ResolvedConfig::from_value(json!({
            "address": "x",
            "connect-time-wait": "soon",
        }))
        .unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let only_user = ResolvedConfig::from_value(json!({
            "address": "x",
            "username": "admin",
        }))
        .unwrap();
        assert!(only_user.credentials.is_none());

        let both = ResolvedConfig::from_value(json!({
            "address": "x",
            "username": "admin",
            "password": "secret",
        }))
        .unwrap();
        assert_eq!(
            both.credentials,
            Some(Credentials {
                username: "admin".to_string(),
                password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn test_rendering_never_leaks_password() {
        let config = ResolvedConfig::from_value(json!({
            "name": "n",
            "address": "x",
            "username": "admin",
            "password": "secret",
        }))
        .unwrap();

        let rendered = config.to_string();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("\"connect-retry-wait\":\"2s\""));
        assert!(rendered.contains("\"format\":\"event\""));

        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
    }
}
