//! Domain-specific assertions for lognorm harnesses.
//!
//! These add context-rich failure messages that make it clear *which*
//! guarantee was violated and on *which* entry.

use std::time::Duration;

use lognorm_core::labels;
use lognorm_core::EcsLogEntry;

use super::fake_broker::Action;

// ---------------------------------------------------------------------------
// Entry assertions
// ---------------------------------------------------------------------------

/// Assert that an entry carries a specific level.
///
/// ```rust
/// assert_level!(entry, LogLevel::Error);
/// ```
#[macro_export]
macro_rules! assert_level {
    ($entry:expr, $level:expr) => {{
        let entry: &lognorm_core::EcsLogEntry = &$entry;
        let expected: lognorm_core::LogLevel = $level;
        match entry.level() {
            Some(actual) if actual == expected => {}
            Some(actual) => panic!(
                "assert_level! failed:\n  expected: {:?}\n  actual:   {:?}\n  message: {:?}",
                expected, actual, entry.message
            ),
            None => panic!(
                "assert_level! failed: no level on entry.\n  message: {:?}",
                entry.message
            ),
        }
    }};
}

/// Assert that an entry has a label with an expected value.
///
/// ```rust
/// assert_label!(entry, "job_name", "api");
/// ```
#[macro_export]
macro_rules! assert_label {
    ($entry:expr, $key:expr, $value:expr) => {{
        let entry: &lognorm_core::EcsLogEntry = &$entry;
        let key: &str = $key;
        let expected: &str = $value;
        match entry.labels.get(key) {
            Some(actual) if actual == expected => {}
            Some(actual) => panic!(
                "assert_label! failed:\n  entry.labels[{:?}]\n  expected: {:?}\n  actual:   {:?}",
                key, expected, actual
            ),
            None => panic!(
                "assert_label! failed: label {:?} not found.\n  Available labels: {:?}",
                key,
                entry.labels.keys().collect::<Vec<_>>()
            ),
        }
    }};
}

/// Parse-error annotation of `entry`, or `""` when there is none.
pub fn parse_error(entry: &EcsLogEntry) -> &str {
    entry
        .process_error
        .as_ref()
        .and_then(|err| err.parse_error.as_deref())
        .unwrap_or("")
}

/// Every entry leaving the normaliser has an id, a timestamp, a level and
/// the job labels, whatever went wrong on the way.
pub fn assert_canonical(entry: &EcsLogEntry) {
    assert!(!entry.id.is_empty(), "entry id is empty: {:?}", entry.message);
    assert!(
        entry.timestamp.is_some(),
        "entry has no timestamp: {:?}",
        entry.message
    );
    assert!(entry.level().is_some(), "entry has no level: {:?}", entry.message);
    for key in [labels::JOB_NAME, labels::JOB_TYPE] {
        let value = entry.labels.get(key).map(String::as_str).unwrap_or("");
        assert!(
            !value.is_empty(),
            "entry is missing label {key:?}: {:?}",
            entry.labels
        );
    }
    if let Some(err) = &entry.process_error {
        let annotated = err.parse_error.is_some() || err.unmarshal_error.is_some();
        assert!(annotated, "process_error present but empty: {err:?}");
    }
}

// ---------------------------------------------------------------------------
// Delivery assertions
// ---------------------------------------------------------------------------

/// Exactly one of ack / nack, after the in-progress signal.
pub fn assert_single_terminal(id: &str, actions: &[Action]) {
    let terminal: Vec<&Action> = actions.iter().filter(|a| a.is_terminal()).collect();
    assert_eq!(
        terminal.len(),
        1,
        "message {id:?} must get exactly one terminal action, got {actions:?}"
    );
    assert_eq!(
        actions.first(),
        Some(&Action::InProgress),
        "message {id:?} was not marked in progress first: {actions:?}"
    );
}

/// The single terminal action was a nack with `delay`.
pub fn assert_nacked(id: &str, actions: &[Action], delay: Duration) {
    assert_single_terminal(id, actions);
    assert!(
        actions.contains(&Action::Nack(delay)),
        "message {id:?} expected nack({delay:?}), got {actions:?}"
    );
}

/// The single terminal action was an ack.
pub fn assert_acked(id: &str, actions: &[Action]) {
    assert_single_terminal(id, actions);
    assert!(
        actions.contains(&Action::Ack),
        "message {id:?} expected ack, got {actions:?}"
    );
}
