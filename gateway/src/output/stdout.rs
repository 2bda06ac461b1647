//! Stdout output for debugging
//!
//! Prints each message to stdout as `<subject> <payload>`, one per line, in
//! the configured format. Binary `proto` payloads are summarized instead of
//! dumped.

use crate::output::encode::{OutputFormat, encode, is_textproto};
use crate::output::subject::SubjectStrategy;
use async_trait::async_trait;
use relay_core::{Metadata, Output, PluginError, TelemetryMessage};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct StdoutConfig {
    subject_prefix: String,
    subject: String,
    format: String,
}

/// Stdout output - prints messages for debugging
pub struct StdoutOutput {
    subject: SubjectStrategy,
    format: OutputFormat,
    /// Count of messages written
    written_count: AtomicU64,
}

impl StdoutOutput {
    pub fn new(subject: SubjectStrategy, format: OutputFormat) -> Self {
        Self {
            subject,
            format,
            written_count: AtomicU64::new(0),
        }
    }

    /// Build from raw settings; reads `subject-prefix`, `subject` and `format`
    pub fn from_value(raw: serde_json::Value) -> Result<Self, PluginError> {
        let config: StdoutConfig = if raw.is_null() {
            StdoutConfig::default()
        } else {
            serde_json::from_value(raw)
                .map_err(|e| PluginError::Config(format!("invalid stdout output config: {e}")))?
        };
        let format = config.format.parse()?;
        let subject = SubjectStrategy::from_settings(&config.subject_prefix, &config.subject);
        Ok(Self::new(subject, format))
    }

    /// Get total messages written
    pub fn written_count(&self) -> u64 {
        self.written_count.load(Ordering::Relaxed)
    }

    fn render(&self, message: &TelemetryMessage, meta: &Metadata) -> Result<Option<String>, PluginError> {
        let Some(payload) = encode(message, self.format, meta)? else {
            return Ok(None);
        };
        let subject = self.subject.resolve(meta);
        let line = match self.format {
            OutputFormat::Proto => {
                format!("{subject} [{}] {} bytes", message.kind(), payload.len())
            }
            OutputFormat::Event | OutputFormat::Json => {
                format!("{subject} {}", String::from_utf8_lossy(&payload))
            }
        };
        Ok(Some(line))
    }
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::new(
            SubjectStrategy::from_settings("", ""),
            OutputFormat::default(),
        )
    }
}

#[async_trait]
impl Output for StdoutOutput {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn write(&self, message: &TelemetryMessage, meta: &Metadata) {
        use std::io::Write;

        if is_textproto(meta) {
            return;
        }

        let line = match self.render(message, meta) {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                error!(output = "stdout", error = %e, "failed to encode message");
                return;
            }
        };

        let mut stdout = std::io::stdout().lock();
        match writeln!(stdout, "{line}") {
            Ok(()) => {
                self.written_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => error!(output = "stdout", error = %e, "stdout write failed"),
        }
    }

    async fn health(&self) -> bool {
        true
    }
}
