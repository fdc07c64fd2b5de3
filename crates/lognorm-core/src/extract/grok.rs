//! Grok-matched strategy: split free text with a registered pattern.
//!
//! The pattern must capture `timestamp`, `level` and `message`; it may also
//! capture `origin` (mapped to `log.origin`). `thread` becomes the
//! `thread_id` label and `component` keeps its name. Any other capture is
//! labelled `grok_<capture>`, as is a capture whose plain label the adapter
//! already set. Adapter labels are never overwritten.

use crate::types::{LogOrigin, OriginFile};

use super::{info, init_from_record, Context, Steps};

const CAPTURE_TIMESTAMP: &str = "timestamp";
const CAPTURE_LEVEL: &str = "level";
const CAPTURE_MESSAGE: &str = "message";
const CAPTURE_ORIGIN: &str = "origin";
const LABEL_PREFIX: &str = "grok_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grok {
    name: String,
    pattern: String,
}

impl Grok {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

fn label_for_capture(capture: &str) -> String {
    match capture {
        "thread" => "thread_id".to_string(),
        "component" => "component".to_string(),
        other => format!("{LABEL_PREFIX}{other}"),
    }
}

impl Steps for Grok {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Option<&str> {
        Some(&self.pattern)
    }

    fn init(&self, cx: &mut Context<'_>) {
        init_from_record(cx);
        match cx.patterns.matches(&self.pattern, &cx.record.message) {
            Ok(captures) if captures.is_empty() => cx
                .errors
                .push(format!("message does not match pattern {}", self.pattern)),
            Ok(captures) => cx.fields = captures,
            Err(err) => cx.errors.push(err.to_string()),
        }
    }

    fn timestamp(&self, cx: &mut Context<'_>) {
        let token = cx.take_first(&[CAPTURE_TIMESTAMP]);
        cx.resolve_timestamp(token);
    }

    fn message(&self, cx: &mut Context<'_>) {
        cx.entry.message = cx
            .take_first(&[CAPTURE_MESSAGE])
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

    fn log_info(&self, cx: &mut Context<'_>) {
        let level = cx.take_first(&[CAPTURE_LEVEL]);
        cx.resolve_level(level);
        let Some(origin) = cx.take_first(&[CAPTURE_ORIGIN]) else {
            return;
        };
        // Captured origins are always source locations, line or not.
        let origin = match LogOrigin::from_caller(&origin) {
            LogOrigin { file: None, .. } => LogOrigin {
                file: Some(OriginFile {
                    name: origin,
                    line: None,
                }),
                function: None,
            },
            parsed => parsed,
        };
        if let Some(log) = cx.entry.log.as_mut() {
            log.origin = Some(origin);
        }
    }

    fn finish(&self, cx: &mut Context<'_>) {
        for (capture, value) in cx.fields.drain() {
            let mut label = label_for_capture(&capture);
            if cx.entry.labels.contains_key(&label) {
                label = format!("{LABEL_PREFIX}{capture}");
            }
            cx.entry.labels.entry(label).or_insert(value);
        }
    }
}
