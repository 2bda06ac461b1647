//! relay-gateway - telemetry to NATS
//!
//! Republishes collected telemetry onto a NATS broker, one subject per
//! source and subscription.
//!
//! ```text
//! (message, metadata) ──► subject ──► encode ──► publish
//!                                                 │
//!                              ConnectionManager ─┘  (dial, retry, close)
//! ```
//!
//! Outputs are built by name from an [`OutputRegistry`], so a host can pick
//! the destination from configuration.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod error;
pub mod output;
pub mod shutdown;

pub use config::{Config, LogFormat};
pub use error::{PluginError, RelayError, Result};
pub use output::nats::{ConnectionManager, Dialer, NatsOutput, Publish, ResolvedConfig};
pub use output::{OutputFormat, OutputRegistry, StdoutOutput, SubjectStrategy};
pub use relay_core::{EventMsg, Metadata, Output, TelemetryMessage};
pub use shutdown::{Shutdown, ShutdownSignal};
