//! Structured adapter: the payload already is a canonical ECS document.

use lognorm_core::extract::KEY_ECS;
use lognorm_core::labels;
use lognorm_core::{EcsLogEntry, IntermediateRecord, LogLevel, RawMessage};

use crate::{fill_required_labels, set_label, unmarshal_failure, Adapter, SourceError};

pub const SOURCE_NAME: &str = "ecs";

#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredAdapter;

impl Adapter for StructuredAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn convert(&self, message: &RawMessage<'_>) -> IntermediateRecord {
        let entry: EcsLogEntry = match serde_json::from_slice(message.payload) {
            Ok(entry) => entry,
            Err(err) => return unmarshal_failure(SOURCE_NAME, message, &SourceError::from(err)),
        };

        let mut record = IntermediateRecord::new(KEY_ECS, message.text());
        if let Some(ts) = entry.timestamp {
            record.fallback_timestamp = ts;
        }
        record.fallback_level = entry.level().unwrap_or(LogLevel::Unknown);

        let service = entry.service.as_ref();
        let host = entry.host.as_ref();
        let mut out = std::collections::BTreeMap::new();
        out.insert(labels::SOURCE.to_string(), SOURCE_NAME.to_string());
        set_label(
            &mut out,
            labels::JOB_NAME,
            entry
                .labels
                .get(labels::JOB_NAME)
                .cloned()
                .or_else(|| service.and_then(|s| s.name.clone())),
        );
        set_label(
            &mut out,
            labels::JOB_TYPE,
            entry
                .labels
                .get(labels::JOB_TYPE)
                .cloned()
                .or_else(|| service.and_then(|s| s.kind.clone())),
        );
        set_label(&mut out, labels::HOST_NAME, host.and_then(|h| h.name.clone()));
        set_label(&mut out, labels::HOST_ID, host.and_then(|h| h.id.clone()));
        fill_required_labels(&mut out);

        record.labels = out;
        record.parsed = Some(entry);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn convert(payload: &str) -> IntermediateRecord {
        let headers = HashMap::new();
        StructuredAdapter.convert(&RawMessage::new("logs.ecs", &headers, payload.as_bytes()))
    }

    #[test]
    fn canonical_document_is_carried_as_parsed() {
        let record = convert(
            r#"{"@timestamp":"2023-03-20T15:06:45Z","message":"hi","log":{"level":"error"},
                "service":{"name":"billing","type":"service"},"host":{"name":"node-1","id":"b7c1"}}"#,
        );
        assert_eq!(record.pattern_key, "ecs");
        assert_eq!(record.fallback_level, LogLevel::Error);
        assert_eq!(record.labels[labels::JOB_NAME], "billing");
        assert_eq!(record.labels[labels::JOB_TYPE], "service");
        assert_eq!(record.labels[labels::HOST_ID], "b7c1");
        assert_eq!(record.parsed.unwrap().message, "hi");
    }

    #[test]
    fn non_document_is_an_unmarshal_failure() {
        let record = convert("[1, 2, 3]");
        assert!(record.parsed.is_none());
        assert!(record.unmarshal_error.is_some());
        assert_eq!(record.pattern_key, "");
    }
}
