//! relay-core - Core types for the telemetry relay
//!
//! This crate provides the foundational types shared between the relay
//! gateway (which owns the concrete outputs) and anything that feeds it:
//!
//! - [`TelemetryMessage`] - the decoded response handed to every output
//! - [`Metadata`] - per-message annotations from the collector
//! - [`Output`] trait - async interface for republishing messages
//! - [`PluginError`] - error type for output operations
//! - [`event`] - flattening of subscribe updates into event records
//! - [`metadata_keys`] - reserved metadata key constants
//! - [`proto`] - the telemetry protocol messages (prost + serde)
//!
//! # Why this crate exists
//!
//! Collectors produce messages and outputs consume them. Keeping the shared
//! types here lets a collector depend on the message model without pulling
//! in the broker client and its runtime:
//!
//! ```text
//! relay-core ◄── relay-gateway ◄── relay-runtime
//!     ▲
//!     └────────── collector
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod error;
/// Event record conversion for subscribe updates
pub mod event;
/// The telemetry message envelope
pub mod message;
/// Reserved metadata key constants
pub mod metadata_keys;
mod output;

/// Protocol types, field-for-field with the upstream gnmi.proto definitions
pub mod proto {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]
    #![allow(clippy::derive_partial_eq_without_eq)]
    #![allow(missing_docs)]

    pub(crate) mod float_json;

    pub mod gnmi {
        include!("proto/gnmi.rs");
    }

    pub mod google {
        pub mod protobuf {
            include!("proto/google.protobuf.rs");
        }
    }
}

pub use error::PluginError;
pub use event::EventMsg;
pub use message::{Metadata, TelemetryMessage};
pub use output::Output;
