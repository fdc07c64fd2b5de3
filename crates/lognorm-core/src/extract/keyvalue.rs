//! Key-value (logfmt) strategy.
//!
//! The message is decoded once in `init`. Each later step takes the keys it
//! recognises out of the working set; whatever is left when `finish` runs
//! becomes a `logfmt_<key>` label.

use crate::logfmt;
use crate::types::{ErrorInfo, EventInfo, LogOrigin, SpanInfo, TraceInfo, UserInfo};

use super::{info, init_from_record, Context, Steps};

const TIMESTAMP_KEYS: &[&str] = &["ts", "time", "timestamp", "@timestamp", "t"];
const MESSAGE_KEYS: &[&str] = &["msg", "message"];
const ERROR_KEYS: &[&str] = &["err", "error", "error.message"];
const STACK_KEYS: &[&str] = &["stacktrace", "stack_trace"];
const ERROR_TYPE_KEYS: &[&str] = &["error.type", "error_type"];
const ORIGIN_KEYS: &[&str] = &["caller", "origin", "source_location", "func"];
const LEVEL_KEYS: &[&str] = &["level", "lvl", "severity", "log.level"];
const USER_ID_KEYS: &[&str] = &["user", "user_id", "user.id"];
const USER_NAME_KEYS: &[&str] = &["user.name", "username"];
const EVENT_KIND_KEYS: &[&str] = &["event", "event.kind", "kind"];
const EVENT_ACTION_KEYS: &[&str] = &["event.action", "action"];
const TRACE_KEYS: &[&str] = &["trace_id", "traceId", "trace.id", "traceID"];
const SPAN_KEYS: &[&str] = &["span_id", "spanId", "span.id", "spanID"];

/// Prefix marking labels that came from unrecognised key-value pairs.
pub const LEFTOVER_PREFIX: &str = "logfmt_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyValue;

impl Steps for KeyValue {
    fn name(&self) -> &str {
        super::KEY_LOGFMT
    }

    fn init(&self, cx: &mut Context<'_>) {
        init_from_record(cx);
        let (pairs, err) = logfmt::decode(&cx.record.message);
        if let Some(err) = err {
            cx.errors.push(err.to_string());
        }
        cx.fields = pairs;
    }

    fn timestamp(&self, cx: &mut Context<'_>) {
        let token = cx.take_first(TIMESTAMP_KEYS);
        cx.resolve_timestamp(token);
    }

    fn message(&self, cx: &mut Context<'_>) {
        cx.entry.message = cx
            .take_first(MESSAGE_KEYS)
            .unwrap_or_else(|| cx.record.message.clone());
    }

    fn container_info(&self, cx: &mut Context<'_>) {
        info::container(cx);
    }

    fn agent_info(&self, cx: &mut Context<'_>) {
        info::agent(cx);
    }

    fn host_info(&self, cx: &mut Context<'_>) {
        info::host(cx);
    }

    fn organization_info(&self, cx: &mut Context<'_>) {
        info::organization(cx);
    }

    fn service_info(&self, cx: &mut Context<'_>) {
        info::service(cx);
    }

    fn error_info(&self, cx: &mut Context<'_>) {
        let error = ErrorInfo {
            message: cx.take_first(ERROR_KEYS),
            kind: cx.take_first(ERROR_TYPE_KEYS),
            stack_trace: cx.take_first(STACK_KEYS),
            code: None,
        };
        if error != ErrorInfo::default() {
            cx.entry.error = Some(error);
        }
    }

    fn log_info(&self, cx: &mut Context<'_>) {
        let origin = cx.take_first(ORIGIN_KEYS);
        let level = cx.take_first(LEVEL_KEYS);
        cx.resolve_level(level);
        if let (Some(origin), Some(log)) = (origin, cx.entry.log.as_mut()) {
            log.origin = Some(LogOrigin::from_caller(&origin));
        }
    }

    fn user_info(&self, cx: &mut Context<'_>) {
        let user = UserInfo {
            id: cx.take_first(USER_ID_KEYS),
            name: cx.take_first(USER_NAME_KEYS),
        };
        if user != UserInfo::default() {
            cx.entry.user = Some(user);
        }
    }

    fn event_info(&self, cx: &mut Context<'_>) {
        let event = EventInfo {
            kind: cx.take_first(EVENT_KIND_KEYS),
            action: cx.take_first(EVENT_ACTION_KEYS),
        };
        if event != EventInfo::default() {
            cx.entry.event = Some(event);
        }
    }

    fn tracing_info(&self, cx: &mut Context<'_>) {
        if let Some(id) = cx.take_first(TRACE_KEYS) {
            cx.entry.trace = Some(TraceInfo { id });
        }
        if let Some(id) = cx.take_first(SPAN_KEYS) {
            cx.entry.span = Some(SpanInfo { id });
        }
    }

    fn finish(&self, cx: &mut Context<'_>) {
        for (key, value) in cx.fields.drain() {
            cx.entry.labels.insert(format!("{LEFTOVER_PREFIX}{key}"), value);
        }
    }
}
