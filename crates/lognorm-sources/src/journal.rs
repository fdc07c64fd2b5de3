//! Journal adapter: one journald JSON export entry per message
//! (`journalctl -o json`).
//!
//! Journal lines are routed to the Default strategy: the pattern key is
//! always empty, whatever the text looks like.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lognorm_core::labels;
use lognorm_core::{IntermediateRecord, LogLevel, RawMessage};
use serde::Deserialize;
use serde_json::Value;

use crate::{fill_required_labels, set_label, unmarshal_failure, Adapter, SourceError};

pub const SOURCE_NAME: &str = "journal";
pub const JOB_TYPE: &str = "system";

#[derive(Debug, Deserialize)]
struct JournalEntry {
    #[serde(rename = "MESSAGE", default)]
    message: Option<Value>,
    #[serde(rename = "PRIORITY")]
    priority: Option<String>,
    /// Microseconds since the Unix epoch, as a decimal string.
    #[serde(rename = "__REALTIME_TIMESTAMP")]
    realtime_timestamp: Option<String>,
    #[serde(rename = "_HOSTNAME")]
    hostname: Option<String>,
    #[serde(rename = "_MACHINE_ID")]
    machine_id: Option<String>,
    #[serde(rename = "SYSLOG_IDENTIFIER")]
    syslog_identifier: Option<String>,
    #[serde(rename = "_SYSTEMD_UNIT")]
    systemd_unit: Option<String>,
    #[serde(rename = "_PID")]
    pid: Option<String>,
}

/// journald exports non-UTF-8 messages as an array of byte values.
fn message_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(Value::Array(items)) => {
            let bytes: Vec<u8> = items
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|b| u8::try_from(b).ok())
                .collect();
            String::from_utf8_lossy(&bytes).into_owned()
        }
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JournalAdapter;

impl Adapter for JournalAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn convert(&self, message: &RawMessage<'_>) -> IntermediateRecord {
        let entry: JournalEntry = match serde_json::from_slice(message.payload) {
            Ok(entry) => entry,
            Err(err) => return unmarshal_failure(SOURCE_NAME, message, &SourceError::from(err)),
        };

        let mut record = IntermediateRecord::new("", message_text(entry.message));
        if let Some(ts) = entry
            .realtime_timestamp
            .as_deref()
            .and_then(|us| us.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_micros)
        {
            record.fallback_timestamp = ts;
        }
        record.fallback_level = entry
            .priority
            .as_deref()
            .map(LogLevel::from_keyword_or_unknown)
            .unwrap_or(LogLevel::Unknown);

        let job_name = entry
            .syslog_identifier
            .clone()
            .or_else(|| entry.systemd_unit.clone());

        let mut out = BTreeMap::new();
        out.insert(labels::SOURCE.to_string(), SOURCE_NAME.to_string());
        out.insert(labels::JOB_TYPE.to_string(), JOB_TYPE.to_string());
        set_label(&mut out, labels::JOB_NAME, job_name);
        set_label(&mut out, labels::HOST_NAME, entry.hostname);
        set_label(&mut out, labels::HOST_ID, entry.machine_id);
        set_label(&mut out, "systemd_unit", entry.systemd_unit);
        set_label(&mut out, "syslog_identifier", entry.syslog_identifier);
        set_label(&mut out, "pid", entry.pid);
        fill_required_labels(&mut out);
        record.labels = out;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn convert(payload: &str) -> IntermediateRecord {
        let headers = HashMap::new();
        JournalAdapter.convert(&RawMessage::new("logs.journal", &headers, payload.as_bytes()))
    }

    #[test]
    fn export_entry_is_mapped() {
        let record = convert(
            r#"{"MESSAGE":"Started Session 4 of user core.","PRIORITY":"6",
                "__REALTIME_TIMESTAMP":"1679324805057000","_HOSTNAME":"node-1",
                "_MACHINE_ID":"b7c1","SYSLOG_IDENTIFIER":"systemd","_SYSTEMD_UNIT":"init.scope","_PID":"1"}"#,
        );
        assert_eq!(record.pattern_key, "");
        assert_eq!(record.message, "Started Session 4 of user core.");
        assert_eq!(record.fallback_level, LogLevel::Info);
        assert_eq!(
            record.fallback_timestamp,
            Utc.timestamp_micros(1_679_324_805_057_000).unwrap()
        );
        assert_eq!(record.labels[labels::JOB_NAME], "systemd");
        assert_eq!(record.labels[labels::JOB_TYPE], "system");
        assert_eq!(record.labels[labels::HOST_NAME], "node-1");
        assert_eq!(record.labels[labels::HOST_ID], "b7c1");
        assert_eq!(record.labels["systemd_unit"], "init.scope");
        assert_eq!(record.labels["pid"], "1");
    }

    #[rstest]
    #[case::emergency("0", LogLevel::Fatal)]
    #[case::err("3", LogLevel::Error)]
    #[case::warning("4", LogLevel::Warn)]
    #[case::debug("7", LogLevel::Debug)]
    #[case::garbage("x", LogLevel::Unknown)]
    fn priority_sets_fallback_level(#[case] priority: &str, #[case] expected: LogLevel) {
        let record = convert(&format!(r#"{{"MESSAGE":"m","PRIORITY":"{priority}"}}"#));
        assert_eq!(record.fallback_level, expected);
    }

    #[test]
    fn binary_message_is_lossy_decoded() {
        let record = convert(r#"{"MESSAGE":[104,105,255]}"#);
        assert_eq!(record.message, "hi\u{fffd}");
    }

    #[test]
    fn unit_is_job_name_without_identifier() {
        let record = convert(r#"{"MESSAGE":"m","_SYSTEMD_UNIT":"sshd.service"}"#);
        assert_eq!(record.labels[labels::JOB_NAME], "sshd.service");
        assert_eq!(record.labels[labels::HOST_ID], "unknown");
    }

    #[test]
    fn invalid_json_is_an_unmarshal_failure() {
        let record = convert("MESSAGE=not json");
        assert!(record.unmarshal_error.is_some());
        assert_eq!(record.labels[labels::SOURCE], "journal");
    }
}
