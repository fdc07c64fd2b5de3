use crate::labels;
use crate::types::EcsLogEntry;

use super::{init_from_record, Context, Steps};

/// Label that keeps an id the producer had already assigned.
pub const ORIGINAL_ID_LABEL: &str = "ecs_original_id";

/// Structured passthrough: the record already is (or carries) a canonical
/// entry.
///
/// Falls back to the record's message and fallbacks when the text does not
/// parse, and records why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Structured;

impl Steps for Structured {
    fn name(&self) -> &str {
        super::KEY_ECS
    }

    fn init(&self, cx: &mut Context<'_>) {
        let restored = match &cx.record.parsed {
            Some(entry) => Some(entry.clone()),
            None => match serde_json::from_str::<EcsLogEntry>(&cx.record.message) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    cx.errors.push(format!("not a structured entry: {err}"));
                    None
                }
            },
        };

        let mut original_id = None;
        if let Some(mut entry) = restored {
            original_id = Some(std::mem::take(&mut entry.id)).filter(|id| !id.is_empty());
            cx.entry = entry;
            cx.restored = true;
        }

        // Always a fresh id, restored entries included.
        init_from_record(cx);
        if let Some(id) = original_id {
            cx.fields.insert(ORIGINAL_ID_LABEL.to_string(), id);
        }
    }

    fn timestamp(&self, cx: &mut Context<'_>) {
        if !cx.restored || cx.entry.timestamp.is_none() {
            cx.entry.timestamp = Some(cx.record.fallback_timestamp);
        }
    }

    fn message(&self, cx: &mut Context<'_>) {
        if !cx.restored {
            cx.entry.message = cx.record.message.clone();
        }
    }

    fn tags(&self, cx: &mut Context<'_>) {
        cx.entry.tags.extend(cx.record.tags.iter().cloned());
    }

    fn labels(&self, cx: &mut Context<'_>) {
        cx.entry.labels.extend(
            cx.record
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        cx.entry
            .labels
            .insert(labels::USED_PATTERN.to_string(), self.name().to_string());
        if let Some(id) = cx.fields.remove(ORIGINAL_ID_LABEL) {
            cx.entry.labels.insert(ORIGINAL_ID_LABEL.to_string(), id);
        }
    }

    fn log_info(&self, cx: &mut Context<'_>) {
        if cx.entry.log.is_none() {
            cx.entry.set_level(cx.record.fallback_level);
        }
    }
}
