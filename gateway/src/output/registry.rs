//! Output registry
//!
//! Maps output type names to factories. The host owns the registry, fills it
//! at startup and builds the configured output from it.
//!
//! # Invariants
//!
//! - Each type name maps to exactly one factory; registering again replaces it
//! - Unknown type names are a configuration error
//! - Type names are case-sensitive strings

use crate::output::nats::NatsOutput;
use crate::output::stdout::StdoutOutput;
use crate::shutdown::ShutdownSignal;
use futures::future::BoxFuture;
use relay_core::{Output, PluginError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

type BuildFuture = BoxFuture<'static, Result<Arc<dyn Output>, PluginError>>;

/// Builds an output from its raw settings
///
/// The signal lets a factory that blocks on a remote peer give up when the
/// host shuts down first.
pub type OutputFactory =
    Arc<dyn Fn(serde_json::Value, ShutdownSignal) -> BuildFuture + Send + Sync>;

/// Registry of output factories
///
/// # Example
///
/// ```ignore
/// use relay_gateway::output::OutputRegistry;
///
/// let registry = OutputRegistry::with_builtin();
/// let shutdown = Shutdown::new();
/// let output = registry
///     .build("nats", serde_json::json!({ "address": "localhost:4222" }), shutdown.signal())
///     .await?;
/// ```
#[derive(Default)]
pub struct OutputRegistry {
    factories: HashMap<String, OutputFactory>,
}

impl OutputRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `nats` and `stdout` outputs
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("nats", |raw, cancel| async move {
            let output = NatsOutput::init(raw, cancel).await?;
            Ok(Arc::new(output) as Arc<dyn Output>)
        });
        registry.register("stdout", |raw, _cancel| async move {
            let output = StdoutOutput::from_value(raw)?;
            Ok(Arc::new(output) as Arc<dyn Output>)
        });
        registry
    }

    /// Register a factory under `name`
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(serde_json::Value, ShutdownSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn Output>, PluginError>> + Send + 'static,
    {
        let name = name.into();
        info!(output = %name, "registered output type");
        let factory: OutputFactory = Arc::new(
            move |raw: serde_json::Value, cancel: ShutdownSignal| -> BuildFuture {
                Box::pin(factory(raw, cancel))
            },
        );
        self.factories.insert(name, factory);
    }

    /// Build the output registered under `name`
    pub async fn build(
        &self,
        name: &str,
        raw: serde_json::Value,
        cancel: ShutdownSignal,
    ) -> Result<Arc<dyn Output>, PluginError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::Config(format!("unknown output type: {name}")))?;
        factory(raw, cancel).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shutdown::Shutdown;
    use async_trait::async_trait;
    use relay_core::{Metadata, TelemetryMessage};
    use serde_json::json;

    struct Named(&'static str);

    #[async_trait]
    impl Output for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn write(&self, _message: &TelemetryMessage, _meta: &Metadata) {}

        async fn health(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_builtin_names() {
        let registry = OutputRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["nats", "stdout"]);
        assert!(registry.contains("nats"));
        assert!(!registry.contains("NATS"));
    }

    #[tokio::test]
    async fn test_build_stdout() {
        let registry = OutputRegistry::with_builtin();
        let shutdown = Shutdown::new();
        let output = registry
            .build("stdout", json!({}), shutdown.signal())
            .await
            .unwrap();
        assert_eq!(output.name(), "stdout");
    }

    #[tokio::test]
    async fn test_unknown_type_is_config_error() {
        let registry = OutputRegistry::with_builtin();
        let shutdown = Shutdown::new();
        let err = registry
            .build("kafka", json!({}), shutdown.signal())
            .await
            .err()
            .unwrap();
        assert_eq!(err, PluginError::Config("unknown output type: kafka".to_string()));
    }

    #[tokio::test]
    async fn test_nats_config_error_surfaces() {
        let registry = OutputRegistry::with_builtin();
        let shutdown = Shutdown::new();
        let err = registry
            .build("nats", json!({ "address": "x", "format": "xml" }), shutdown.signal())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PluginError::Config(_)));
    }

    #[tokio::test]
    async fn test_register_replaces() {
        let mut registry = OutputRegistry::new();
        registry.register("custom", |_, _| async {
            Ok(Arc::new(Named("first")) as Arc<dyn Output>)
        });
        registry.register("custom", |_, _| async {
            Ok(Arc::new(Named("second")) as Arc<dyn Output>)
        });

        let shutdown = Shutdown::new();
        let output = registry
            .build("custom", json!(null), shutdown.signal())
            .await
            .unwrap();
        assert_eq!(output.name(), "second");
        assert_eq!(registry.names(), vec!["custom"]);
    }
}
