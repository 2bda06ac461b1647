//! Telemetry message envelope
//!
//! The collection pipeline hands every output a decoded protocol message
//! together with a metadata map. The message is one of a closed set of
//! response kinds, so outputs match on it exhaustively instead of probing
//! types at runtime.
//!
//! ```text
//! collector ──► (TelemetryMessage, Metadata) ──► Output::write
//! ```

use crate::error::PluginError;
use crate::proto::gnmi::{GetResponse, SubscribeResponse};
use prost::Message as _;
use std::collections::HashMap;

/// Per-message annotations from the collector (`source`, `subscription-name`, ...)
///
/// Read-only to outputs. See [`crate::metadata_keys`] for the reserved keys.
pub type Metadata = HashMap<String, String>;

/// A decoded telemetry response
///
/// # Example
///
/// ```
/// use relay_core::TelemetryMessage;
/// use relay_core::proto::gnmi::{SubscribeResponse, subscribe_response::Response};
///
/// let msg = TelemetryMessage::from(SubscribeResponse {
///     response: Some(Response::SyncResponse(true)),
/// });
/// assert_eq!(msg.kind(), "subscribe_response");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    /// Streamed update, sync marker or error from a subscription
    Subscribe(SubscribeResponse),
    /// One-shot snapshot returned by a Get
    Get(GetResponse),
}

impl TelemetryMessage {
    /// Short name of the response kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryMessage::Subscribe(_) => "subscribe_response",
            TelemetryMessage::Get(_) => "get_response",
        }
    }

    /// The subscribe response, if this is one
    pub fn as_subscribe(&self) -> Option<&SubscribeResponse> {
        match self {
            TelemetryMessage::Subscribe(rsp) => Some(rsp),
            TelemetryMessage::Get(_) => None,
        }
    }

    /// Binary protobuf encoding of the inner message
    pub fn encode_proto(&self) -> Vec<u8> {
        match self {
            TelemetryMessage::Subscribe(rsp) => rsp.encode_to_vec(),
            TelemetryMessage::Get(rsp) => rsp.encode_to_vec(),
        }
    }

    /// Indented JSON encoding of the inner message using schema field names
    pub fn encode_json_pretty(&self) -> Result<Vec<u8>, PluginError> {
        let encoded = match self {
            TelemetryMessage::Subscribe(rsp) => serde_json::to_vec_pretty(rsp),
            TelemetryMessage::Get(rsp) => serde_json::to_vec_pretty(rsp),
        };
        encoded.map_err(|e| PluginError::Encode(format!("json: {e}")))
    }
}

impl From<SubscribeResponse> for TelemetryMessage {
    fn from(rsp: SubscribeResponse) -> Self {
        TelemetryMessage::Subscribe(rsp)
    }
}

impl From<GetResponse> for TelemetryMessage {
    fn from(rsp: GetResponse) -> Self {
        TelemetryMessage::Get(rsp)
    }
}
