//! Reserved metadata keys supplied by the collection pipeline
//!
//! Metadata travels beside each telemetry message as plain string pairs.
//! These are the keys outputs read; everything else is passed through as
//! event tags.

/// Name of the target the message was collected from, e.g. `"router1:57400"`
pub const SOURCE: &str = "source";

/// Name of the subscription that produced the message
pub const SUBSCRIPTION_NAME: &str = "subscription-name";

/// Transport representation the message originally arrived in
pub const FORMAT: &str = "format";

/// `FORMAT` value marking a plain-text protobuf representation
pub const FORMAT_TEXTPROTO: &str = "textproto";

/// Subscription name used for events when metadata carries none
pub const DEFAULT_SUBSCRIPTION_NAME: &str = "default";
