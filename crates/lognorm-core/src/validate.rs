//! Post-extraction validation.
//!
//! An entry leaving the pipeline always has a timestamp, a level and the
//! `job_name`/`job_type` labels. Missing values are repaired with explicit
//! fallbacks and every repair is reported back as a parse-error line; a
//! repaired entry is still delivered.

use crate::labels;
use crate::level::LogLevel;
use crate::types::{EcsLogEntry, IntermediateRecord};

/// Labels an entry must carry after extraction.
const REQUIRED_LABELS: [&str; 2] = [labels::JOB_NAME, labels::JOB_TYPE];

/// Repair `entry` in place. Returns one message per repair.
pub fn repair(entry: &mut EcsLogEntry, record: &IntermediateRecord) -> Vec<String> {
    let mut repairs = Vec::new();

    for key in REQUIRED_LABELS {
        let missing = entry.labels.get(key).map_or(true, String::is_empty);
        if missing {
            entry
                .labels
                .insert(key.to_string(), labels::UNKNOWN.to_string());
            repairs.push(format!("missing label {key:?}, set to {:?}", labels::UNKNOWN));
        }
    }

    if entry.timestamp.is_none() {
        entry.timestamp = Some(record.fallback_timestamp);
        repairs.push("missing timestamp, set to fallback".to_string());
    }

    if entry.level().is_none() {
        entry.set_level(LogLevel::Unknown);
        repairs.push("missing log level, set to \"unknown\"".to_string());
    }

    repairs
}
