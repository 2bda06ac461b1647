//! Feeds a synthetic counter into the configured output once a second.
//!
//! ```bash
//! RELAY_OUTPUT=stdout RELAY_OUTPUT_CONFIG='{"format":"event"}' \
//!     cargo run -p relay-runtime --example synthetic_feed
//! ```

use relay_core::proto::gnmi::subscribe_response::Response;
use relay_core::proto::gnmi::typed_value::Value;
use relay_core::proto::gnmi::{Notification, Path, PathElem, SubscribeResponse, TypedValue, Update};
use relay_runtime::prelude::*;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn counter_update(target: &str, count: u64) -> TelemetryMessage {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default();

    TelemetryMessage::from(SubscribeResponse {
        response: Some(Response::Update(Notification {
            timestamp,
            prefix: Some(Path {
                target: target.to_string(),
                ..Default::default()
            }),
            update: vec![Update {
                path: Some(Path {
                    elem: vec![
                        PathElem {
                            name: "counters".to_string(),
                            ..Default::default()
                        },
                        PathElem {
                            name: "ticks".to_string(),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                }),
                val: Some(TypedValue {
                    value: Some(Value::UintVal(count)),
                }),
                ..Default::default()
            }],
            ..Default::default()
        })),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    relay_runtime::run(|output, mut shutdown| async move {
        let mut meta = Metadata::new();
        meta.insert(metadata_keys::SOURCE.to_string(), "127.0.0.1:57400".to_string());
        meta.insert(metadata_keys::SUBSCRIPTION_NAME.to_string(), "ticks".to_string());

        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let mut count = 0u64;

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = interval.tick() => {
                    count += 1;
                    output.write(&counter_update("synthetic", count), &meta).await;
                }
            }
        }

        Ok(())
    })
    .await
}
