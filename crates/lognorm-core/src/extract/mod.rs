//! Extraction pipeline: turns an [`IntermediateRecord`] into an [`EcsLogEntry`].
//!
//! Every record goes through the same fixed step sequence:
//!
//! ```text
//! init ─► timestamp ─► message ─► tags ─► labels ─► container ─► agent ─► host
//!      ─► organization ─► service ─► error ─► log ─► user ─► event ─► tracing
//!      ─► extract
//! ```
//!
//! What each step does depends on the [`Strategy`] selected for the record's
//! pattern key. Strategies implement [`Steps`]; every default method there is
//! the passthrough behaviour, so a strategy only overrides the steps it knows
//! better.
//!
//! Steps never fail. Anything that goes wrong is pushed onto
//! [`Context::errors`] and ends up newline-joined in the entry's
//! `process_error.parse_error` when [`Extraction::extract`] runs.

mod grok;
mod info;
mod keyvalue;
mod passthrough;
mod structured;

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::level::LogLevel;
use crate::patterns::{PatternRegistry, SIDECAR_PROXY_LOG, TIMESTAMP_LEVEL_MESSAGE};
use crate::timestamp::TimestampNormalizer;
use crate::types::{EcsLogEntry, IntermediateRecord};
use crate::validate;

pub use grok::Grok;
pub use info::producer_identity;
pub use keyvalue::KeyValue;
pub use passthrough::Passthrough;
pub use structured::Structured;

/// Pattern key of the structured passthrough strategy.
pub const KEY_ECS: &str = "ecs";
/// Pattern key of the key-value strategy.
pub const KEY_LOGFMT: &str = "logfmt";
/// Pattern key of the generic timestamp + level + message strategy.
pub const KEY_GENERIC: &str = "generic";
/// Pattern key of the sidecar-proxy strategy.
pub const KEY_SIDECAR_PROXY: &str = "sidecar-proxy";

// ---------------------------------------------------------------------------
// Working state
// ---------------------------------------------------------------------------

/// Working state shared by all steps of one extraction.
#[derive(Debug)]
pub struct Context<'r> {
    pub record: &'r IntermediateRecord,
    pub patterns: &'r PatternRegistry,
    pub timestamps: &'r TimestampNormalizer,
    /// The entry under construction.
    pub entry: EcsLogEntry,
    /// Strategy-local fields not yet mapped onto the entry.
    pub fields: HashMap<String, String>,
    /// Accumulated parse errors.
    pub errors: Vec<String>,
    /// Set by the structured strategy when the record already carried a
    /// canonical entry.
    pub restored: bool,
}

impl<'r> Context<'r> {
    pub fn new(
        record: &'r IntermediateRecord,
        patterns: &'r PatternRegistry,
        timestamps: &'r TimestampNormalizer,
    ) -> Self {
        Self {
            record,
            patterns,
            timestamps,
            entry: EcsLogEntry::default(),
            fields: HashMap::new(),
            errors: Vec::new(),
            restored: false,
        }
    }

    /// Remove and return the first non-empty field among `aliases`.
    pub fn take_first(&mut self, aliases: &[&str]) -> Option<String> {
        for alias in aliases {
            if let Some(value) = self.fields.remove(*alias) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Set the entry timestamp from a captured token, falling back to the
    /// record's fallback timestamp. An unparseable token is a parse error;
    /// no token at all is not.
    pub fn resolve_timestamp(&mut self, token: Option<String>) {
        let fallback = self.record.fallback_timestamp;
        let timestamp = match token {
            None => fallback,
            Some(text) => {
                let producer = producer_identity(self.record);
                match self.timestamps.parse(&producer, &text) {
                    Some(ts) => ts.with_timezone(&Utc),
                    None => {
                        self.errors
                            .push(format!("unrecognised timestamp {text:?}, using fallback"));
                        fallback
                    }
                }
            }
        };
        self.entry.timestamp = Some(timestamp);
    }

    /// Set the entry level from a captured keyword, falling back to the
    /// record's fallback level.
    pub fn resolve_level(&mut self, keyword: Option<String>) {
        let level = match keyword {
            None => self.record.fallback_level,
            Some(keyword) => match LogLevel::from_keyword(&keyword) {
                Some(level) => level,
                None => {
                    self.errors
                        .push(format!("unrecognised log level {keyword:?}, using fallback"));
                    self.record.fallback_level
                }
            },
        };
        self.entry.set_level(level);
    }
}

/// The record-driven part of `init` every strategy shares: a fresh id and
/// any upstream unmarshal failure.
pub fn init_from_record(cx: &mut Context<'_>) {
    cx.entry.id = Uuid::now_v7().to_string();
    if let Some(failure) = &cx.record.unmarshal_error {
        let err = cx.entry.process_error_mut();
        err.raw_data = Some(failure.raw.clone());
        err.subject = Some(failure.subject.clone());
        err.unmarshal_error = Some(failure.reason.clone());
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One implementation per strategy. Default methods are the passthrough
/// behaviour.
pub trait Steps {
    /// Strategy name, stamped on entries where the strategy records itself.
    fn name(&self) -> &str;

    /// Pattern this strategy matches with, if any. Checked at startup.
    fn pattern(&self) -> Option<&str> {
        None
    }

    fn init(&self, cx: &mut Context<'_>) {
        init_from_record(cx);
    }

    fn timestamp(&self, cx: &mut Context<'_>) {
        cx.entry.timestamp = Some(cx.record.fallback_timestamp);
    }

    fn message(&self, cx: &mut Context<'_>) {
        cx.entry.message = cx.record.message.clone();
    }

    fn tags(&self, cx: &mut Context<'_>) {
        cx.entry.tags = cx.record.tags.clone();
    }

    fn labels(&self, cx: &mut Context<'_>) {
        cx.entry.labels = cx.record.labels.clone();
    }

    fn container_info(&self, _cx: &mut Context<'_>) {}

    fn agent_info(&self, _cx: &mut Context<'_>) {}

    fn host_info(&self, _cx: &mut Context<'_>) {}

    fn organization_info(&self, _cx: &mut Context<'_>) {}

    fn service_info(&self, _cx: &mut Context<'_>) {}

    fn error_info(&self, _cx: &mut Context<'_>) {}

    fn log_info(&self, cx: &mut Context<'_>) {
        cx.entry.set_level(LogLevel::Unknown);
    }

    fn user_info(&self, _cx: &mut Context<'_>) {}

    fn event_info(&self, _cx: &mut Context<'_>) {}

    fn tracing_info(&self, _cx: &mut Context<'_>) {}

    /// Runs right before validation; strategies flush leftover fields here.
    fn finish(&self, _cx: &mut Context<'_>) {}
}

/// Closed set of extraction strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Passthrough(Passthrough),
    Structured(Structured),
    KeyValue(KeyValue),
    Grok(Grok),
}

impl Strategy {
    pub fn steps(&self) -> &dyn Steps {
        match self {
            Strategy::Passthrough(s) => s,
            Strategy::Structured(s) => s,
            Strategy::KeyValue(s) => s,
            Strategy::Grok(s) => s,
        }
    }

    pub fn name(&self) -> &str {
        self.steps().name()
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Passthrough(Passthrough)
    }
}

// ---------------------------------------------------------------------------
// Strategy table
// ---------------------------------------------------------------------------

/// Pattern key → strategy. Unknown keys resolve to the Default strategy.
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    by_key: HashMap<String, Strategy>,
    fallback: Strategy,
}

impl StrategyTable {
    /// The built-in pattern keys.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        table.insert(KEY_ECS, Strategy::Structured(Structured));
        table.insert(KEY_LOGFMT, Strategy::KeyValue(KeyValue));
        table.insert(
            KEY_GENERIC,
            Strategy::Grok(Grok::new(KEY_GENERIC, TIMESTAMP_LEVEL_MESSAGE)),
        );
        table.insert(
            KEY_SIDECAR_PROXY,
            Strategy::Grok(Grok::new(KEY_SIDECAR_PROXY, SIDECAR_PROXY_LOG)),
        );
        table
    }

    pub fn insert(&mut self, key: &str, strategy: Strategy) -> Option<Strategy> {
        self.by_key.insert(key.to_string(), strategy)
    }

    pub fn resolve(&self, key: &str) -> &Strategy {
        match self.by_key.get(key) {
            Some(strategy) => strategy,
            None => {
                if !key.is_empty() {
                    tracing::debug!(pattern_key = key, "unknown pattern key, using default strategy");
                }
                &self.fallback
            }
        }
    }

    /// `(pattern key, strategy)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Strategy)> {
        self.by_key.iter().map(|(key, s)| (key.as_str(), s))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// One extraction in progress. Each step consumes and returns the builder so
/// the sequence reads as a single chain.
pub struct Extraction<'r> {
    steps: &'r dyn Steps,
    cx: Context<'r>,
}

impl<'r> Extraction<'r> {
    pub fn init(steps: &'r dyn Steps, mut cx: Context<'r>) -> Self {
        steps.init(&mut cx);
        Self { steps, cx }
    }

    pub fn timestamp(mut self) -> Self {
        self.steps.timestamp(&mut self.cx);
        self
    }

    pub fn message(mut self) -> Self {
        self.steps.message(&mut self.cx);
        self
    }

    pub fn tags(mut self) -> Self {
        self.steps.tags(&mut self.cx);
        self
    }

    pub fn labels(mut self) -> Self {
        self.steps.labels(&mut self.cx);
        self
    }

    pub fn container_info(mut self) -> Self {
        self.steps.container_info(&mut self.cx);
        self
    }

    pub fn agent_info(mut self) -> Self {
        self.steps.agent_info(&mut self.cx);
        self
    }

    pub fn host_info(mut self) -> Self {
        self.steps.host_info(&mut self.cx);
        self
    }

    pub fn organization_info(mut self) -> Self {
        self.steps.organization_info(&mut self.cx);
        self
    }

    pub fn service_info(mut self) -> Self {
        self.steps.service_info(&mut self.cx);
        self
    }

    pub fn error_info(mut self) -> Self {
        self.steps.error_info(&mut self.cx);
        self
    }

    pub fn log_info(mut self) -> Self {
        self.steps.log_info(&mut self.cx);
        self
    }

    pub fn tracing_info(mut self) -> Self {
        self.steps.tracing_info(&mut self.cx);
        self
    }

    pub fn user_info(mut self) -> Self {
        self.steps.user_info(&mut self.cx);
        self
    }

    pub fn event_info(mut self) -> Self {
        self.steps.event_info(&mut self.cx);
        self
    }

    /// Flush the strategy, repair missing required fields and attach every
    /// accumulated error.
    pub fn extract(mut self) -> EcsLogEntry {
        self.steps.finish(&mut self.cx);

        let Context {
            record,
            mut entry,
            mut errors,
            ..
        } = self.cx;
        errors.extend(validate::repair(&mut entry, record));

        if !errors.is_empty() {
            tracing::debug!(
                strategy = self.steps.name(),
                errors = errors.len(),
                "extraction annotated with parse errors"
            );
            entry.append_parse_error(&errors.join("\n"));
        }
        entry
    }
}

/// Run the full step sequence for `record` with `strategy`.
pub fn run(strategy: &Strategy, cx: Context<'_>) -> EcsLogEntry {
    run_steps(strategy.steps(), cx)
}

fn run_steps<'r>(steps: &'r dyn Steps, cx: Context<'r>) -> EcsLogEntry {
    Extraction::init(steps, cx)
        .timestamp()
        .message()
        .tags()
        .labels()
        .container_info()
        .agent_info()
        .host_info()
        .organization_info()
        .service_info()
        .error_info()
        .log_info()
        .user_info()
        .event_info()
        .tracing_info()
        .extract()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
