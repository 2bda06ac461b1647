//! Outputs
//!
//! - [`subject`] - per-message subject resolution
//! - [`encode`] - wire formats and suppression rules
//! - [`nats`] - the NATS publisher
//! - [`stdout`] - debugging output
//! - [`registry`] - type name to factory table

pub mod encode;
pub mod nats;
pub mod registry;
pub mod stdout;
pub mod subject;

pub use encode::OutputFormat;
pub use nats::NatsOutput;
pub use registry::{OutputFactory, OutputRegistry};
pub use stdout::StdoutOutput;
pub use subject::SubjectStrategy;
