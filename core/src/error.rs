//! Error types for relay outputs

use thiserror::Error;

/// Error type for output operations
///
/// This is the standard error type used by every output adapter. It provides
/// structured error categories that map onto the relay's failure policy:
/// configuration errors are fatal at startup, everything else is logged and
/// the affected message is dropped.
///
/// # Example
///
/// ```
/// use relay_core::PluginError;
///
/// fn parse_format(raw: &str) -> Result<(), PluginError> {
///     Err(PluginError::Config(format!("unsupported output format: {raw}")))
/// }
///
/// match parse_format("xml") {
///     Err(PluginError::Config(msg)) => assert!(msg.contains("xml")),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// Configuration error
    ///
    /// Raw configuration could not be decoded or holds an unsupported value.
    /// Fatal at startup: the output never becomes usable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Encode failed
    ///
    /// A message could not be serialized or converted to event records.
    /// Only the affected message is dropped.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Connection error
    ///
    /// A single dial attempt failed. Retried by the connection manager.
    #[error("connection error: {0}")]
    Connection(String),

    /// Publish failed
    ///
    /// The broker rejected the message or the transport failed at call time.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Cancelled
    ///
    /// A blocking operation observed the shutdown signal and gave up.
    #[error("operation cancelled")]
    Cancelled,

    /// Not ready
    ///
    /// The output has no live connection yet (or any more).
    #[error("output not ready")]
    NotReady,

    /// Shutdown error
    ///
    /// Releasing the connection failed, e.g. the final flush errored.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}
