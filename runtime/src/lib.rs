//! Relay runtime - process wiring around an output
//!
//! Provides [`run()`] for zero-boilerplate startup, and [`RuntimeBuilder`]
//! for hosts that pick the output or its settings in code.
//!
//! The caller supplies the feed: a future that receives the built output and
//! a shutdown signal, and writes messages until the signal fires.
//!
//! # Quick start
//!
//! ```ignore
//! use relay_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     relay_runtime::run(|output, mut shutdown| async move {
//!         shutdown.triggered().await;
//!         Ok(())
//!     }).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod prelude;

use relay_core::{Output, PluginError};
use relay_gateway::config::{Config, LogFormat};
use relay_gateway::error::RelayError;
use relay_gateway::output::OutputRegistry;
use relay_gateway::shutdown::{Shutdown, ShutdownSignal};
use std::future::Future;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the relay with settings from the environment.
///
/// Loads configuration, initialises tracing, builds the configured output,
/// hands it to `feed`, and closes it on SIGINT/SIGTERM or when `feed`
/// returns.
pub async fn run<F, Fut>(feed: F) -> anyhow::Result<()>
where
    F: FnOnce(Arc<dyn Output>, ShutdownSignal) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    RuntimeBuilder::new().start(feed).await
}

/// Builder for controlling which output is built and how.
///
/// # Example
///
/// ```ignore
/// RuntimeBuilder::new()
///     .output("stdout")
///     .output_config(serde_json::json!({ "format": "json" }))
///     .start(|output, shutdown| async move { Ok(()) })
///     .await
/// ```
pub struct RuntimeBuilder {
    registry: OutputRegistry,
    output: Option<String>,
    output_config: Option<serde_json::Value>,
}

impl RuntimeBuilder {
    /// Builder with the built-in outputs and settings from the environment.
    pub fn new() -> Self {
        Self {
            registry: OutputRegistry::with_builtin(),
            output: None,
            output_config: None,
        }
    }

    /// Replace the output registry.
    pub fn registry(mut self, registry: OutputRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override the output type. Default: `RELAY_OUTPUT`, or `nats`.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.output = Some(name.into());
        self
    }

    /// Override the output settings. Default: `RELAY_OUTPUT_CONFIG`.
    pub fn output_config(mut self, raw: serde_json::Value) -> Self {
        self.output_config = Some(raw);
        self
    }

    /// Build the output and run `feed` until shutdown.
    ///
    /// This is the terminal method - it blocks until shutdown.
    pub async fn start<F, Fut>(self, feed: F) -> anyhow::Result<()>
    where
        F: FnOnce(Arc<dyn Output>, ShutdownSignal) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        // ── 1. Load config from env ──────────────────────────────
        let config = Config::from_env()?;

        // ── 2. Init tracing ──────────────────────────────────────
        init_tracing(&config);

        // ── 3. Build the output and drive it ─────────────────────
        self.serve(config, feed, shutdown_signal()).await
    }

    /// Everything after process setup; `stop` stands in for OS signals.
    async fn serve<F, Fut, S>(self, config: Config, feed: F, stop: S) -> anyhow::Result<()>
    where
        F: FnOnce(Arc<dyn Output>, ShutdownSignal) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
        S: Future<Output = ()>,
    {
        let name = self.output.unwrap_or(config.output);
        let raw = self.output_config.unwrap_or(config.output_config);

        info!(output = %name, "Starting relay");

        let shutdown = Shutdown::new();
        let build = self.registry.build(&name, raw, shutdown.signal());
        tokio::pin!(build);
        tokio::pin!(stop);

        // the output may block until its peer is reachable
        let early = tokio::select! {
            built = &mut build => Some(built),
            _ = &mut stop => None,
        };
        let stopped = early.is_none();
        let built = match early {
            Some(built) => built,
            None => {
                shutdown.trigger();
                build.await
            }
        };
        let output = match built {
            Ok(output) => output,
            Err(PluginError::Cancelled) => {
                info!(output = %name, "Shutdown before output was ready");
                return Ok(());
            }
            Err(e) => return Err(RelayError::plugin(name.clone(), e).into()),
        };

        let feed = feed(Arc::clone(&output), shutdown.signal());
        tokio::pin!(feed);

        let fed = if stopped {
            feed.await
        } else {
            let finished = tokio::select! {
                result = &mut feed => Some(result),
                _ = &mut stop => None,
            };
            match finished {
                Some(result) => result,
                None => {
                    shutdown.trigger();
                    feed.await
                }
            }
        };

        if let Err(e) = &fed {
            error!(output = %name, error = %e, "Feed failed");
        }

        output
            .close()
            .await
            .map_err(|e| RelayError::plugin(name.clone(), e))?;
        info!(output = %name, "Relay shutdown complete");

        fed
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialise the tracing subscriber based on config.
pub fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
