//! Message encoding
//!
//! Serializes a telemetry message into the configured wire format, or
//! decides that it should not be published at all.
//!
//! | Format  | Payload                                            |
//! |---------|----------------------------------------------------|
//! | `proto` | binary protobuf of the message as-is               |
//! | `json`  | indented JSON with schema field names              |
//! | `event` | indented JSON array of event records (updates only)|

use bytes::Bytes;
use relay_core::event::response_to_events;
use relay_core::metadata_keys;
use relay_core::proto::gnmi::subscribe_response::Response;
use relay_core::{Metadata, PluginError, TelemetryMessage};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Wire format of published payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Flattened event records as JSON
    #[default]
    Event,
    /// Schema-aware JSON of the message
    Json,
    /// Binary protobuf of the message
    Proto,
}

impl FromStr for OutputFormat {
    type Err = PluginError;

    /// Parses `event`, `json` or `proto`; an empty string means `event`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "event" => Ok(OutputFormat::Event),
            "json" => Ok(OutputFormat::Json),
            "proto" => Ok(OutputFormat::Proto),
            other => Err(PluginError::Config(format!(
                "unsupported output format: {other}"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Event => "event",
            OutputFormat::Json => "json",
            OutputFormat::Proto => "proto",
        };
        f.write_str(name)
    }
}

/// True when the collector marked the message as plain-text protobuf
///
/// Such messages are never published, whatever the output format.
pub fn is_textproto(meta: &Metadata) -> bool {
    meta.get(metadata_keys::FORMAT)
        .is_some_and(|f| f == metadata_keys::FORMAT_TEXTPROTO)
}

/// Encode a message for publishing
///
/// Returns `Ok(None)` when the message is suppressed: sync markers and error
/// responses under `event` format, and any non-subscribe message under
/// `event` format. Errors mean the message must be dropped.
pub fn encode(
    message: &TelemetryMessage,
    format: OutputFormat,
    meta: &Metadata,
) -> Result<Option<Bytes>, PluginError> {
    match format {
        OutputFormat::Proto => Ok(Some(Bytes::from(message.encode_proto()))),
        OutputFormat::Json => message.encode_json_pretty().map(|b| Some(Bytes::from(b))),
        OutputFormat::Event => encode_events(message, meta),
    }
}

fn encode_events(message: &TelemetryMessage, meta: &Metadata) -> Result<Option<Bytes>, PluginError> {
    let Some(rsp) = message.as_subscribe() else {
        debug!(kind = message.kind(), "event format only applies to subscribe responses");
        return Ok(None);
    };

    match &rsp.response {
        Some(Response::Update(_)) => {
            let subscription_name = meta
                .get(metadata_keys::SUBSCRIPTION_NAME)
                .map(String::as_str)
                .unwrap_or(metadata_keys::DEFAULT_SUBSCRIPTION_NAME);
            let events = response_to_events(subscription_name, rsp, meta)?;
            let payload = serde_json::to_vec_pretty(&events)
                .map_err(|e| PluginError::Encode(format!("events: {e}")))?;
            Ok(Some(Bytes::from(payload)))
        }
        Some(Response::SyncResponse(_)) => {
            info!(meta = ?meta, "received subscribe syncResponse");
            Ok(None)
        }
        Some(Response::Error(err)) => {
            warn!(
                meta = ?meta,
                code = err.code,
                message = %err.message,
                data = ?err.data,
                "received subscribe response error"
            );
            Ok(None)
        }
        None => Ok(None),
    }
}
