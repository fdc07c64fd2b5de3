//! Core types for lognorm-core.
//!
//! This module defines the data structures shared across every layer of the
//! normaliser: the adapter-facing [`RawMessage`] view, the
//! [`IntermediateRecord`] an adapter produces, and the canonical
//! [`EcsLogEntry`] the extraction pipeline materialises.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::LogLevel;

// ---------------------------------------------------------------------------
// Adapter input / output
// ---------------------------------------------------------------------------

/// Borrowed view of one inbound broker message, handed to an adapter.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a> {
    pub subject: &'a str,
    pub headers: &'a HashMap<String, String>,
    pub payload: &'a [u8],
}

impl<'a> RawMessage<'a> {
    pub fn new(subject: &'a str, headers: &'a HashMap<String, String>, payload: &'a [u8]) -> Self {
        Self {
            subject,
            headers,
            payload,
        }
    }

    /// Payload as text (UTF-8 lossy converted).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.payload).into_owned()
    }
}

/// Marker set on an [`IntermediateRecord`] when the adapter could not parse
/// the payload into its source-specific shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmarshalFailure {
    /// Raw payload (UTF-8 lossy converted).
    pub raw: String,
    /// Subject the payload arrived on.
    pub subject: String,
    pub reason: String,
}

/// Adapter output prior to canonical normalisation.
///
/// Created once per inbound message and read-only to the extraction
/// pipeline. The fallbacks are used whenever the pipeline cannot recover a
/// value from the message text itself.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateRecord {
    /// Producer-declared pattern key; selects the extraction strategy.
    pub pattern_key: String,
    /// Raw message text.
    pub message: String,
    pub fallback_timestamp: DateTime<Utc>,
    pub fallback_level: LogLevel,
    /// Unique-keyed labels. See [`crate::labels`] for the standard keys.
    pub labels: BTreeMap<String, String>,
    /// Ordered tags; duplicates allowed.
    pub tags: Vec<String>,
    /// Set when the source format already is the canonical schema.
    pub parsed: Option<EcsLogEntry>,
    pub unmarshal_error: Option<UnmarshalFailure>,
}

impl IntermediateRecord {
    pub fn new(pattern_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern_key: pattern_key.into(),
            message: message.into(),
            fallback_timestamp: Utc::now(),
            fallback_level: LogLevel::Unknown,
            labels: BTreeMap::new(),
            tags: Vec::new(),
            parsed: None,
            unmarshal_error: None,
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Canonical entry
// ---------------------------------------------------------------------------

/// The canonical log entry every source is normalised into.
///
/// Serialises to an ECS-shaped JSON document. Absent sub-records are omitted
/// and unknown fields are ignored on the way back in, so consumers can
/// deserialise by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsLogEntry {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<SpanInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventInfo>,
    /// Present iff something failed upstream or during extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_error: Option<ProcessError>,
}

impl EcsLogEntry {
    /// `true` once any failure has been recorded on this entry.
    pub fn has_failed(&self) -> bool {
        self.process_error.is_some()
    }

    pub fn process_error_mut(&mut self) -> &mut ProcessError {
        self.process_error.get_or_insert_with(ProcessError::default)
    }

    /// Append one line to the parse-error annotation.
    pub fn append_parse_error(&mut self, line: &str) {
        let err = self.process_error_mut();
        match err.parse_error.as_mut() {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(line);
            }
            _ => err.parse_error = Some(line.to_string()),
        }
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.log.as_ref().map(|l| l.level)
    }

    pub fn set_level(&mut self, level: LogLevel) {
        let origin = self.log.take().and_then(|l| l.origin);
        self.log = Some(LogInfo {
            origin,
            ..LogInfo::new(level)
        });
    }
}

/// `log.*`: level, its emoji, and where in the producer the line came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInfo {
    pub level: LogLevel,
    #[serde(default)]
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LogOrigin>,
}

impl LogInfo {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            emoji: level.emoji().to_string(),
            origin: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOrigin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<OriginFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginFile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl LogOrigin {
    /// Interpret a `caller`-style value: `file.go:42` becomes a file origin,
    /// anything without a numeric line suffix is treated as a function name.
    pub fn from_caller(caller: &str) -> Self {
        let caller = caller.trim();
        if let Some((file, line)) = caller.rsplit_once(':') {
            if let Ok(line) = line.parse::<u32>() {
                return Self {
                    file: Some(OriginFile {
                        name: file.to_string(),
                        line: Some(line),
                    }),
                    function: None,
                };
            }
        }
        Self {
            file: None,
            function: Some(caller.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ContainerImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerImage {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceInfo {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanInfo {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Failure annotation carried by an [`EcsLogEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmarshal_error: Option<String>,
    /// Newline-joined parse errors accumulated during extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
