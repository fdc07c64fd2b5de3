//! Test builders: ergonomic constructors for records and source payloads.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use lognorm_core::labels;
use lognorm_core::{IntermediateRecord, LogLevel, RawMessage};
use serde_json::{json, Value};

/// Fixed fallback timestamp used by builders, far from any sample literal.
pub fn fallback_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`IntermediateRecord`] fixtures.
///
/// # Example
///
/// ```rust
/// let record = RecordBuilder::new("logfmt", "level=info msg=up")
///     .job("api", "service")
///     .service("api", "2.4.1")
///     .build();
/// ```
pub struct RecordBuilder {
    record: IntermediateRecord,
}

impl RecordBuilder {
    pub fn new(pattern_key: &str, message: impl Into<String>) -> Self {
        let mut record = IntermediateRecord::new(pattern_key, message);
        record.fallback_timestamp = fallback_ts();
        record.fallback_level = LogLevel::Info;
        Self { record }
    }

    pub fn job(self, name: &str, kind: &str) -> Self {
        self.label(labels::JOB_NAME, name).label(labels::JOB_TYPE, kind)
    }

    pub fn service(self, name: &str, version: &str) -> Self {
        self.label(labels::SERVICE_NAME, name)
            .label(labels::SERVICE_VERSION, version)
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.record.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.record.tags.push(tag.to_string());
        self
    }

    pub fn fallback_level(mut self, level: LogLevel) -> Self {
        self.record.fallback_level = level;
        self
    }

    pub fn build(self) -> IntermediateRecord {
        self.record
    }
}

// ---------------------------------------------------------------------------
// EnvelopeBuilder
// ---------------------------------------------------------------------------

/// Builds the JSON envelope the container adapter reads.
pub struct EnvelopeBuilder {
    doc: Value,
}

impl EnvelopeBuilder {
    pub fn new(log: &str) -> Self {
        Self {
            doc: json!({ "log": log, "stream": "stdout" }),
        }
    }

    pub fn pattern(mut self, key: &str) -> Self {
        self.doc["pattern"] = json!(key);
        self
    }

    pub fn stderr(mut self) -> Self {
        self.doc["stream"] = json!("stderr");
        self
    }

    pub fn time(mut self, time: &str) -> Self {
        self.doc["time"] = json!(time);
        self
    }

    pub fn job(mut self, name: &str, kind: &str) -> Self {
        self.doc["job"] = json!({ "name": name, "type": kind });
        self
    }

    pub fn node(mut self, name: &str, id: &str) -> Self {
        self.doc["node"] = json!({ "name": name, "id": id });
        self
    }

    pub fn container(mut self, id: &str, name: &str, image: &str) -> Self {
        self.doc["container"] = json!({ "id": id, "name": name, "image": image });
        self
    }

    pub fn service(mut self, name: &str, version: &str) -> Self {
        self.doc["service"] = json!({ "name": name, "version": version });
        self
    }

    pub fn build(self) -> String {
        self.doc.to_string()
    }
}

/// Wrap `payload` in a [`RawMessage`] on `subject` and hand it to `f`.
pub fn with_raw<T>(subject: &str, payload: &[u8], f: impl FnOnce(&RawMessage<'_>) -> T) -> T {
    let headers = HashMap::new();
    f(&RawMessage::new(subject, &headers, payload))
}
