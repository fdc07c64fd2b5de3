//! Container log adapter.
//!
//! Reads the JSON envelope a container log shipper wraps around each line:
//!
//! ```json
//! {"log": "...", "stream": "stderr", "time": "2023-03-20T15:06:45Z",
//!  "pattern": "generic",
//!  "job": {"name": "api", "type": "service", "group": "web", "task": "api-1"},
//!  "node": {"name": "node-1", "id": "b7c1"},
//!  "container": {"id": "4f2a", "name": "api-1", "image": "api:2.4.1"},
//!  "service": {"name": "api", "version": "2.4.1", "environment": "prod"},
//!  "tags": ["edge"], "labels": {"team": "core"}}
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lognorm_core::labels;
use lognorm_core::{IntermediateRecord, LogLevel, RawMessage};
use serde::Deserialize;

use crate::{fill_required_labels, set_label, unmarshal_failure, Adapter, SourceError};

pub const SOURCE_NAME: &str = "container";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, alias = "message")]
    log: String,
    #[serde(default)]
    stream: Option<String>,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    job: Job,
    #[serde(default)]
    node: Node,
    #[serde(default)]
    container: Container,
    #[serde(default)]
    service: Service,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct Job {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    group: Option<String>,
    task: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Node {
    name: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Container {
    id: Option<String>,
    name: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Service {
    name: Option<String>,
    version: Option<String>,
    environment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerAdapter;

impl ContainerAdapter {
    fn parse(payload: &[u8]) -> Result<Envelope, SourceError> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Err(SourceError::Empty);
        }
        Ok(serde_json::from_slice(payload)?)
    }
}

impl Adapter for ContainerAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn convert(&self, message: &RawMessage<'_>) -> IntermediateRecord {
        let envelope = match Self::parse(message.payload) {
            Ok(envelope) => envelope,
            Err(err) => return unmarshal_failure(SOURCE_NAME, message, &err),
        };

        let mut record = IntermediateRecord::new(envelope.pattern, envelope.log);
        if let Some(time) = envelope.time {
            record.fallback_timestamp = time;
        }
        record.fallback_level = match envelope.stream.as_deref() {
            Some("stderr") => LogLevel::Error,
            _ => LogLevel::Info,
        };
        record.tags = envelope.tags;

        let mut out = envelope.labels;
        out.insert(labels::SOURCE.to_string(), SOURCE_NAME.to_string());
        set_label(&mut out, labels::JOB_NAME, envelope.job.name);
        set_label(&mut out, labels::JOB_TYPE, envelope.job.kind);
        set_label(&mut out, labels::TASK_GROUP, envelope.job.group);
        set_label(&mut out, labels::TASK_NAME, envelope.job.task);
        set_label(&mut out, labels::HOST_NAME, envelope.node.name);
        set_label(&mut out, labels::HOST_ID, envelope.node.id);
        set_label(&mut out, labels::CONTAINER_ID, envelope.container.id);
        set_label(&mut out, labels::CONTAINER_NAME, envelope.container.name);
        set_label(&mut out, labels::CONTAINER_IMAGE, envelope.container.image);
        set_label(&mut out, labels::SERVICE_NAME, envelope.service.name);
        set_label(&mut out, labels::SERVICE_VERSION, envelope.service.version);
        set_label(&mut out, labels::SERVICE_ENVIRONMENT, envelope.service.environment);
        fill_required_labels(&mut out);
        record.labels = out;
        record
    }
}
