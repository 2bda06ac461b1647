//! Subject resolution
//!
//! Turns the configured subject strategy plus per-message metadata into the
//! literal subject a payload is published under.

use relay_core::Metadata;
use relay_core::metadata_keys;
use serde::Serialize;

/// Subject used when neither a prefix nor a static subject is configured
pub const DEFAULT_SUBJECT: &str = "telemetry";

/// How the publish subject is built
///
/// Resolved once at configuration time; a prefix takes precedence over a
/// static subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectStrategy {
    /// `<prefix>[.<source>][.<subscription-name>]` from message metadata
    Prefix(String),
    /// The same literal subject for every message
    Static(String),
}

impl SubjectStrategy {
    /// Pick the strategy from raw `subject-prefix` / `subject` settings
    pub fn from_settings(subject_prefix: &str, subject: &str) -> Self {
        if !subject_prefix.is_empty() {
            SubjectStrategy::Prefix(subject_prefix.to_string())
        } else if !subject.is_empty() {
            SubjectStrategy::Static(subject.to_string())
        } else {
            SubjectStrategy::Static(DEFAULT_SUBJECT.to_string())
        }
    }

    /// Build the subject for one message
    ///
    /// In prefix mode the `source` value has `.` replaced by `-` and spaces by
    /// `_` so a dotted address cannot add subject tokens; the subscription
    /// name is appended verbatim. Spaces left anywhere in the result become `_`.
    pub fn resolve(&self, meta: &Metadata) -> String {
        let subject = match self {
            SubjectStrategy::Prefix(prefix) => {
                let mut subject = prefix.clone();
                if let Some(source) = meta.get(metadata_keys::SOURCE) {
                    subject.push('.');
                    subject.push_str(&source.replace('.', "-").replace(' ', "_"));
                }
                if let Some(sub) = meta.get(metadata_keys::SUBSCRIPTION_NAME) {
                    subject.push('.');
                    subject.push_str(sub);
                }
                subject
            }
            SubjectStrategy::Static(subject) => subject.clone(),
        };
        subject.replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_takes_precedence() {
        let strategy = SubjectStrategy::from_settings("telemetry", "ignored");
        assert_eq!(strategy, SubjectStrategy::Prefix("telemetry".to_string()));
    }

    #[test]
    fn test_static_subject_when_no_prefix() {
        let strategy = SubjectStrategy::from_settings("", "my.subject");
        assert_eq!(strategy, SubjectStrategy::Static("my.subject".to_string()));
    }

    #[test]
    fn test_default_subject_when_nothing_configured() {
        let strategy = SubjectStrategy::from_settings("", "");
        assert_eq!(strategy.resolve(&Metadata::new()), DEFAULT_SUBJECT);
    }

    #[test]
    fn test_prefix_with_source_and_subscription() {
        let strategy = SubjectStrategy::from_settings("gnmi", "");
        let subject = strategy.resolve(&meta(&[
            ("source", "10.0.0.1:57400"),
            ("subscription-name", "port-stats"),
        ]));
        assert_eq!(subject, "gnmi.10-0-0-1:57400.port-stats");
    }

    #[test]
    fn test_source_dots_and_spaces_are_escaped() {
        let strategy = SubjectStrategy::from_settings("pfx", "");
        let subject = strategy.resolve(&meta(&[("source", "a.b c")]));
        assert_eq!(subject, "pfx.a-b_c");

        let source_segment = subject.strip_prefix("pfx.").unwrap_or_default();
        assert!(!source_segment.contains('.'));
        assert!(!source_segment.contains(' '));
    }

    #[test]
    fn test_prefix_without_metadata() {
        let strategy = SubjectStrategy::from_settings("pfx", "");
        assert_eq!(strategy.resolve(&Metadata::new()), "pfx");
    }

    #[test]
    fn test_subscription_only() {
        let strategy = SubjectStrategy::from_settings("pfx", "");
        let subject = strategy.resolve(&meta(&[("subscription-name", "sub1")]));
        assert_eq!(subject, "pfx.sub1");
    }

    #[test]
    fn test_spaces_replaced_everywhere() {
        let strategy = SubjectStrategy::from_settings("my prefix", "");
        let subject = strategy.resolve(&meta(&[("subscription-name", "cpu load")]));
        assert_eq!(subject, "my_prefix.cpu_load");
    }

    #[test]
    fn test_static_subject_ignores_metadata() {
        let strategy = SubjectStrategy::from_settings("", "static subject");
        let subject = strategy.resolve(&meta(&[
            ("source", "r1"),
            ("subscription-name", "sub"),
        ]));
        assert_eq!(subject, "static_subject");
    }
}
