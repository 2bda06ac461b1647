//! Error types for the relay host

use thiserror::Error;

pub use relay_core::PluginError;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Main error type for the relay host
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Output error
    #[error("plugin '{plugin}' error: {message}")]
    Plugin { plugin: String, message: String },
}

impl RelayError {
    /// Attribute an output error to the named output
    pub fn plugin(plugin: impl Into<String>, err: PluginError) -> Self {
        match err {
            PluginError::Config(msg) => RelayError::Config(format!("{}: {msg}", plugin.into())),
            other => RelayError::Plugin {
                plugin: plugin.into(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_attributed_config_error_stays_config() {
        let err = RelayError::plugin("nats", PluginError::Config("bad format".to_string()));
        assert!(matches!(err, RelayError::Config(_)));
        assert_eq!(err.to_string(), "configuration error: nats: bad format");
    }

    #[test]
    fn test_attributed_runtime_error_names_output() {
        let err = RelayError::plugin("nats", PluginError::Shutdown("flush: timed out".to_string()));
        assert_eq!(
            err.to_string(),
            "plugin 'nats' error: shutdown error: flush: timed out"
        );

        let err = RelayError::plugin("nats", PluginError::Cancelled);
        assert_eq!(err.to_string(), "plugin 'nats' error: operation cancelled");
    }
}
