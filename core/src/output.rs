//! Output trait for relay adapters
//!
//! The [`Output`] trait defines the interface for republishing telemetry to
//! an external destination. Outputs are the terminal stage of the pipeline.

use crate::error::PluginError;
use crate::message::{Metadata, TelemetryMessage};
use async_trait::async_trait;

/// Output trait - forwards telemetry messages to a destination
///
/// An output is constructed fully initialized (see the gateway's output
/// registry), receives messages through [`Output::write`] from any number of
/// concurrent callers, and is released once through [`Output::close`].
///
/// # Implementation Requirements
///
/// - Outputs must be `Send + Sync`; `write` is called concurrently
/// - `write` never returns an error: failures are logged and the message dropped
/// - Health checks should be lightweight and not affect normal operation
/// - `close` should cancel pending connection attempts and release resources
///
/// # Example
///
/// ```ignore
/// use relay_core::{Metadata, Output, PluginError, TelemetryMessage};
/// use async_trait::async_trait;
///
/// struct CountingOutput(std::sync::atomic::AtomicU64);
///
/// #[async_trait]
/// impl Output for CountingOutput {
///     fn name(&self) -> &'static str {
///         "counting"
///     }
///
///     async fn write(&self, _message: &TelemetryMessage, _meta: &Metadata) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
///
///     async fn health(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait Output: Send + Sync {
    /// Returns the output type name for identification and logging
    ///
    /// This is the same name the output is registered under, e.g. "nats".
    fn name(&self) -> &'static str;

    /// Forward one message to the destination
    ///
    /// Best effort: encoding and publish failures are logged by the output
    /// and never surfaced to the caller.
    async fn write(&self, message: &TelemetryMessage, meta: &Metadata);

    /// Check if the destination is reachable and accepting messages
    async fn health(&self) -> bool;

    /// Graceful shutdown
    ///
    /// Called once when the host shuts down. The default implementation
    /// returns `Ok(())` for outputs that hold no resources.
    async fn close(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
