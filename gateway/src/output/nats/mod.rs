//! NATS output
//!
//! Republishes each telemetry message on a subject derived from its
//! metadata, in the configured wire format.

pub mod config;
pub mod connection;

pub use config::{Credentials, NatsConfig, ResolvedConfig};
pub use connection::{
    ConnectionManager, Dialer, NatsConnection, NatsDialer, Publish, dial_with_retry,
};

use crate::output::encode::{encode, is_textproto};
use crate::shutdown::ShutdownSignal;
use async_trait::async_trait;
use relay_core::{Metadata, Output, PluginError, TelemetryMessage};
use tracing::{debug, error, info, warn};

/// Output that publishes to a NATS broker
///
/// Lifecycle is linear: [`NatsOutput::init`] connects, [`Output::write`]
/// publishes, [`Output::close`] tears the connection down.
pub struct NatsOutput {
    config: ResolvedConfig,
    connection: ConnectionManager,
}

impl NatsOutput {
    /// Validate raw settings and connect to the configured broker
    ///
    /// Configuration errors are returned before any dial is attempted. Then
    /// blocks until the broker accepts a connection; `cancel` aborts the
    /// wait with [`PluginError::Cancelled`].
    pub async fn init(
        raw: serde_json::Value,
        cancel: ShutdownSignal,
    ) -> Result<Self, PluginError> {
        let config = ResolvedConfig::from_value(raw)?;
        let dialer = NatsDialer::new(&config);
        Self::with_dialer(config, dialer, cancel).await
    }

    /// Connect through a caller supplied dialer
    pub async fn with_dialer<D>(
        config: ResolvedConfig,
        dialer: D,
        cancel: ShutdownSignal,
    ) -> Result<Self, PluginError>
    where
        D: Dialer + 'static,
        D::Connection: Publish + 'static,
    {
        info!(output = "nats", config = %config, "initializing output");

        let connection = ConnectionManager::establish(
            dialer,
            config.address.clone(),
            config.connect_retry_wait,
            cancel,
        )
        .await?;

        Ok(Self { config, connection })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}

#[async_trait]
impl Output for NatsOutput {
    fn name(&self) -> &'static str {
        "nats"
    }

    async fn write(&self, message: &TelemetryMessage, meta: &Metadata) {
        if is_textproto(meta) {
            debug!(kind = message.kind(), "skipping textproto message");
            return;
        }

        let subject = self.config.subject.resolve(meta);

        let payload = match encode(message, self.config.format, meta) {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                error!(subject = %subject, error = %e, "failed to encode message");
                return;
            }
        };

        match self.connection.publish(subject.clone(), payload).await {
            Ok(()) => {}
            Err(PluginError::NotReady) => {
                warn!(subject = %subject, "output closed, dropping message");
            }
            Err(e) => {
                error!(subject = %subject, error = %e, "failed to write to nats subject");
            }
        }
    }

    async fn health(&self) -> bool {
        self.connection.is_connected()
    }

    async fn close(&self) -> Result<(), PluginError> {
        info!(output = "nats", name = %self.config.name, "closing output");
        self.connection.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shutdown::Shutdown;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use relay_core::metadata_keys;
    use relay_core::proto::gnmi::subscribe_response::Response;
    use relay_core::proto::gnmi::{
        GetResponse, Notification, Path, PathElem, SubscribeResponse, TypedValue, Update,
        typed_value::Value as Typed,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // ==========================================================================
    // Test doubles
    // ==========================================================================

    #[derive(Default)]
    struct Capture {
        published: Mutex<Vec<(String, Bytes)>>,
        fail: AtomicBool,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl Publish for Capture {
        async fn publish(&self, subject: String, payload: Bytes) -> Result<(), PluginError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PluginError::Publish("broker gone".to_string()));
            }
            self.published.lock().push((subject, payload));
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.closes.load(Ordering::SeqCst) == 0
        }

        async fn close(&self) -> Result<(), PluginError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CaptureDialer(Arc<Capture>);

    #[async_trait]
    impl Dialer for CaptureDialer {
        type Connection = Arc<Capture>;

        async fn dial(&self, _address: &str) -> Result<Arc<Capture>, PluginError> {
            Ok(Arc::clone(&self.0))
        }
    }

    async fn output(settings: serde_json::Value) -> (NatsOutput, Arc<Capture>) {
        let capture = Arc::new(Capture::default());
        let config = ResolvedConfig::from_value(settings).unwrap();
        let cancel = Shutdown::new();
        let output =
            NatsOutput::with_dialer(config, CaptureDialer(Arc::clone(&capture)), cancel.signal())
                .await
                .unwrap();
        (output, capture)
    }

    fn update() -> TelemetryMessage {
        TelemetryMessage::from(SubscribeResponse {
            response: Some(Response::Update(Notification {
                timestamp: 42,
                prefix: Some(Path {
                    target: "r1".to_string(),
                    ..Default::default()
                }),
                update: vec![Update {
                    path: Some(Path {
                        elem: vec![PathElem {
                            name: "cpu".to_string(),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                    val: Some(TypedValue {
                        value: Some(Typed::UintVal(7)),
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            })),
        })
    }

    fn sync() -> TelemetryMessage {
        TelemetryMessage::from(SubscribeResponse {
            response: Some(Response::SyncResponse(true)),
        })
    }

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ==========================================================================
    // Write
    // ==========================================================================

    #[tokio::test]
    async fn test_write_publishes_events_on_resolved_subject() {
        let (output, capture) = output(json!({
            "address": "nats://x",
            "subject-prefix": "telemetry",
        }))
        .await;

        let meta = meta(&[
            (metadata_keys::SOURCE, "10.0.0.1:57400"),
            (metadata_keys::SUBSCRIPTION_NAME, "sub1"),
        ]);
        output.write(&update(), &meta).await;

        let published = capture.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "telemetry.10-0-0-1:57400.sub1");

        let events: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(events[0]["name"], "sub1");
        assert_eq!(events[0]["values"]["/cpu"], 7);
        assert_eq!(events[0]["tags"]["source"], "10.0.0.1:57400");
    }

    #[tokio::test]
    async fn test_textproto_never_published() {
        for format in ["event", "json", "proto"] {
            let (output, capture) = output(json!({
                "address": "nats://x",
                "format": format,
            }))
            .await;

            let meta = meta(&[(metadata_keys::FORMAT, metadata_keys::FORMAT_TEXTPROTO)]);
            output.write(&update(), &meta).await;

            assert!(capture.published.lock().is_empty(), "format {format}");
        }
    }

    #[tokio::test]
    async fn test_sync_response_suppressed_under_event_format() {
        let (output, capture) = output(json!({ "address": "nats://x" })).await;

        output.write(&sync(), &Metadata::new()).await;

        assert!(capture.published.lock().is_empty());
    }

    #[tokio::test]
    async fn test_sync_response_published_under_proto_format() {
        let (output, capture) = output(json!({
            "address": "nats://x",
            "format": "proto",
        }))
        .await;

        output.write(&sync(), &Metadata::new()).await;

        let published = capture.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "telemetry");
    }

    #[tokio::test]
    async fn test_get_response_published_as_json() {
        let (output, capture) = output(json!({
            "address": "nats://x",
            "subject": "gets",
            "format": "json",
        }))
        .await;

        let message = TelemetryMessage::from(GetResponse::default());
        output.write(&message, &Metadata::new()).await;

        let published = capture.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "gets");
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let (output, capture) = output(json!({ "address": "nats://x" })).await;
        capture.fail.store(true, Ordering::SeqCst);

        output.write(&update(), &Metadata::new()).await;

        assert!(capture.published.lock().is_empty());
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    #[tokio::test]
    async fn test_unsupported_format_fails_init() {
        let cancel = Shutdown::new();
        let err = NatsOutput::init(
            json!({
                "address": "nats://127.0.0.1:1",
                "format": "xml",
            }),
            cancel.signal(),
        )
        .await
        .err()
        .unwrap();

        assert!(matches!(err, PluginError::Config(_)));
    }

    #[tokio::test]
    async fn test_init_cancelled_while_dialing() {
        struct Refusing;

        #[async_trait]
        impl Dialer for Refusing {
            type Connection = Arc<Capture>;

            async fn dial(&self, address: &str) -> Result<Arc<Capture>, PluginError> {
                Err(PluginError::Connection(format!("{address}: refused")))
            }
        }

        let config = ResolvedConfig::from_value(json!({
            "address": "nats://x",
            "connect-time-wait": "10ms",
        }))
        .unwrap();
        let cancel = Shutdown::new();
        let signal = cancel.signal();
        let init = tokio::spawn(async move {
            NatsOutput::with_dialer(config, Refusing, signal).await.map(|_| ())
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!init.is_finished());
        cancel.trigger();

        assert_eq!(init.await.unwrap(), Err(PluginError::Cancelled));
    }

    #[tokio::test]
    async fn test_health_follows_connection() {
        let (output, _capture) = output(json!({ "address": "nats://x" })).await;
        assert_eq!(output.name(), "nats");
        assert!(output.health().await);

        output.close().await.unwrap();
        assert!(!output.health().await);
    }

    #[tokio::test]
    async fn test_write_after_close_drops_message() {
        let (output, capture) = output(json!({ "address": "nats://x" })).await;
        output.close().await.unwrap();
        output.close().await.unwrap();

        output.write(&update(), &Metadata::new()).await;

        assert!(capture.published.lock().is_empty());
        assert_eq!(capture.closes.load(Ordering::SeqCst), 1);
    }
}
