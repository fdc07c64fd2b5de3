//! lognorm-sources: ingestion adapters.
//!
//! An [`Adapter`] turns one raw inbound message into an
//! [`IntermediateRecord`]. Adapters never fail: a payload that cannot be
//! read in the source's shape still yields a record, carrying an
//! [`UnmarshalFailure`] and the minimum label set filled with `unknown`.
//!
//! | Adapter                 | Payload                       | Pattern key          |
//! |-------------------------|-------------------------------|----------------------|
//! | [`ContainerAdapter`]    | container log JSON envelope   | producer-declared    |
//! | [`JournalAdapter`]      | journald JSON export entry    | always empty         |
//! | [`StructuredAdapter`]   | canonical ECS document        | `ecs`                |

pub mod container;
pub mod journal;
pub mod structured;

use std::collections::BTreeMap;

use lognorm_core::labels;
use lognorm_core::{IntermediateRecord, RawMessage, UnmarshalFailure};
use thiserror::Error;

pub use container::ContainerAdapter;
pub use journal::JournalAdapter;
pub use structured::StructuredAdapter;

/// Converts raw inbound messages of one source into intermediate records.
pub trait Adapter: Send + Sync {
    /// Source name, stamped as the `source` label.
    fn name(&self) -> &str;

    fn convert(&self, message: &RawMessage<'_>) -> IntermediateRecord;
}

/// Why a payload could not be read in a source's shape.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is empty")]
    Empty,
}

/// Fill every required label that is missing or empty with `unknown`.
pub fn fill_required_labels(labels: &mut BTreeMap<String, String>) {
    for key in labels::REQUIRED {
        let value = labels.entry(key.to_string()).or_default();
        if value.is_empty() {
            *value = labels::UNKNOWN.to_string();
        }
    }
}

/// The record produced when `message` could not be read by `source`.
pub fn unmarshal_failure(
    source: &str,
    message: &RawMessage<'_>,
    err: &SourceError,
) -> IntermediateRecord {
    tracing::debug!(source, subject = message.subject, error = %err, "payload could not be unmarshalled");
    let raw = message.text();
    let mut record = IntermediateRecord::new("", raw.clone());
    record.unmarshal_error = Some(UnmarshalFailure {
        raw,
        subject: message.subject.to_string(),
        reason: err.to_string(),
    });
    record
        .labels
        .insert(labels::SOURCE.to_string(), source.to_string());
    fill_required_labels(&mut record.labels);
    record
}

/// Insert `value` under `key` unless it is absent or empty.
pub(crate) fn set_label(
    labels: &mut BTreeMap<String, String>,
    key: &str,
    value: Option<impl Into<String>>,
) {
    if let Some(value) = value.map(Into::into).filter(|v: &String| !v.is_empty()) {
        labels.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn unmarshal_failure_carries_raw_payload_and_required_labels() {
        let headers = HashMap::new();
        let message = RawMessage::new("logs.container", &headers, b"{nope");
        let err = SourceError::Empty;
        let record = unmarshal_failure("container", &message, &err);

        let failure = record.unmarshal_error.as_ref().unwrap();
        assert_eq!(failure.raw, "{nope");
        assert_eq!(failure.subject, "logs.container");
        assert_eq!(record.message, "{nope");
        assert_eq!(record.pattern_key, "");
        assert_eq!(record.labels[labels::SOURCE], "container");
        for key in labels::REQUIRED {
            assert!(record.label(key).is_some(), "{key} missing");
        }
        assert_eq!(record.labels[labels::HOST_ID], "unknown");
    }
}
