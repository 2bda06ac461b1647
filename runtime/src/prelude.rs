//! Convenience re-exports for relay hosts.
//!
//! ```rust
//! use relay_runtime::prelude::*;
//! ```

// Message model
pub use relay_core::{EventMsg, Metadata, TelemetryMessage, metadata_keys};

// Outputs
pub use relay_gateway::{NatsOutput, Output, OutputFormat, OutputRegistry, StdoutOutput};

// Shutdown
pub use relay_gateway::{Shutdown, ShutdownSignal};

// Error types
pub use relay_gateway::{PluginError, RelayError};

// Runtime
pub use crate::RuntimeBuilder;
