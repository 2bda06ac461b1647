//! Event records
//!
//! Flattens a subscribe update into self-describing records: one record per
//! updated path, carrying the rendered path, its value, the notification
//! timestamp and tags derived from path keys and message metadata.
//!
//! ```text
//! Notification { prefix: /interfaces/interface[name=eth0],
//!                update: [ state/counters/in-octets = 42 ] }
//!     │
//!     ▼
//! EventMsg { name: "sub1",
//!            tags: { interface_name: eth0, source: r1 },
//!            values: { /interfaces/interface/state/counters/in-octets: 42 } }
//! ```

use crate::error::PluginError;
use crate::message::Metadata;
use crate::metadata_keys;
use crate::proto::float_json::non_finite_name;
use crate::proto::gnmi::subscribe_response::Response;
use crate::proto::gnmi::typed_value::Value as Typed;
use crate::proto::gnmi::{Path, SubscribeResponse, TypedValue};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A flattened telemetry record
///
/// Empty fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMsg {
    /// Subscription name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Notification timestamp, nanoseconds since epoch
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,
    /// Path keys, target and metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Rendered path -> value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, Value>,
    /// Rendered paths removed by the notification
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletes: Vec<String>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// Convert a subscribe response into event records
///
/// Only the update variant yields records; sync markers and errors convert
/// to an empty list. Fails when a JSON-encoded value cannot be parsed.
pub fn response_to_events(
    name: &str,
    rsp: &SubscribeResponse,
    meta: &Metadata,
) -> Result<Vec<EventMsg>, PluginError> {
    let Some(Response::Update(notification)) = &rsp.response else {
        return Ok(Vec::new());
    };

    let (prefix_name, prefix_tags) = path_tags(notification.prefix.as_ref());
    let mut events = Vec::with_capacity(notification.update.len() + 1);

    for update in &notification.update {
        let (path_name, update_tags) = path_tags(update.path.as_ref());
        let path_name = join_path(&prefix_name, &path_name);

        let mut tags = prefix_tags.clone();
        for (key, value) in update_tags {
            match tags.get(&key).map(|existing| *existing == value) {
                Some(true) => {}
                Some(false) => {
                    tags.insert(format!("{path_name}:::{key}"), value);
                }
                None => {
                    tags.insert(key, value);
                }
            }
        }
        add_metadata_tags(&mut tags, meta);

        let values = match update.val.as_ref() {
            Some(val) => flat_values(&path_name, val)?,
            None => BTreeMap::new(),
        };

        events.push(EventMsg {
            name: name.to_string(),
            timestamp: notification.timestamp,
            tags,
            values,
            deletes: Vec::new(),
        });
    }

    if !notification.delete.is_empty() {
        let mut tags = prefix_tags;
        add_metadata_tags(&mut tags, meta);
        let deletes = notification
            .delete
            .iter()
            .map(|path| join_path(&prefix_name, &path_tags(Some(path)).0))
            .collect();

        events.push(EventMsg {
            name: name.to_string(),
            timestamp: notification.timestamp,
            tags,
            values: BTreeMap::new(),
            deletes,
        });
    }

    Ok(events)
}

/// Render a path as `origin:/a/b` and collect its keys as tags
///
/// A key on element `x:name` becomes tag `name_<key>`; keys on an unnamed
/// element keep their bare name. The path target becomes tag `target`.
pub fn path_tags(path: Option<&Path>) -> (String, BTreeMap<String, String>) {
    let mut tags = BTreeMap::new();
    let Some(path) = path else {
        return (String::new(), tags);
    };

    let mut rendered = String::new();
    if !path.origin.is_empty() {
        rendered.push_str(&path.origin);
        rendered.push(':');
    }

    for elem in &path.elem {
        if !elem.name.is_empty() {
            rendered.push('/');
            rendered.push_str(&elem.name);
        }
        for (key, value) in &elem.key {
            if elem.name.is_empty() {
                tags.insert(key.clone(), value.clone());
            } else {
                let short = elem.name.rsplit(':').next().unwrap_or(&elem.name);
                tags.insert(format!("{short}_{key}"), value.clone());
            }
        }
    }

    if !path.target.is_empty() {
        tags.insert("target".to_string(), path.target.clone());
    }

    (rendered, tags)
}

fn join_path(prefix: &str, path: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn add_metadata_tags(tags: &mut BTreeMap<String, String>, meta: &Metadata) {
    for (key, value) in meta {
        if key == metadata_keys::FORMAT {
            continue;
        }
        tags.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

fn flat_values(path: &str, val: &TypedValue) -> Result<BTreeMap<String, Value>, PluginError> {
    let mut values = BTreeMap::new();
    let Some(kind) = &val.value else {
        return Ok(values);
    };

    match kind {
        Typed::JsonVal(raw) | Typed::JsonIetfVal(raw) => {
            if raw.is_empty() {
                return Ok(values);
            }
            let parsed: Value = serde_json::from_slice(raw).map_err(|e| {
                PluginError::Encode(format!("invalid json value at {path}: {e}"))
            })?;
            match parsed {
                Value::Object(_) => flatten_json(path, parsed, &mut values),
                other => {
                    values.insert(path.to_string(), other);
                }
            }
        }
        other => {
            values.insert(path.to_string(), scalar_value(other));
        }
    }

    Ok(values)
}

fn flatten_json(path: &str, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_json(&format!("{path}/{key}"), child, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.into_iter().enumerate() {
                flatten_json(&format!("{path}/{idx}"), child, out);
            }
        }
        leaf => {
            out.insert(path.to_string(), leaf);
        }
    }
}

/// Non-finite values keep their JSON string names instead of becoming null
fn float_value(v: f64) -> Value {
    match non_finite_name(v) {
        Some(name) => Value::String(name.to_string()),
        None => Value::from(v),
    }
}

fn scalar_value(kind: &Typed) -> Value {
    match kind {
        Typed::StringVal(s) | Typed::AsciiVal(s) => Value::String(s.clone()),
        Typed::IntVal(v) => Value::from(*v),
        Typed::UintVal(v) => Value::from(*v),
        Typed::BoolVal(v) => Value::from(*v),
        Typed::FloatVal(v) => float_value(f64::from(*v)),
        Typed::DoubleVal(v) => float_value(*v),
        Typed::BytesVal(b) | Typed::ProtoBytes(b) => Value::String(STANDARD.encode(b)),
        Typed::DecimalVal(d) => {
            let mut obj = Map::new();
            obj.insert("digits".to_string(), Value::from(d.digits));
            obj.insert("precision".to_string(), Value::from(d.precision));
            Value::Object(obj)
        }
        Typed::LeaflistVal(arr) => Value::Array(
            arr.element
                .iter()
                .filter_map(|e| e.value.as_ref().map(scalar_value))
                .collect(),
        ),
        Typed::AnyVal(any) => {
            let mut obj = Map::new();
            obj.insert("typeUrl".to_string(), Value::String(any.type_url.clone()));
            obj.insert("value".to_string(), Value::String(STANDARD.encode(&any.value)));
            Value::Object(obj)
        }
        // Inside leaf-lists only; top-level JSON values are flattened instead.
        Typed::JsonVal(raw) | Typed::JsonIetfVal(raw) => serde_json::from_slice(raw)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned())),
    }
}
