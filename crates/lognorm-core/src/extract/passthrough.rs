use super::Steps;

/// Default strategy: every step keeps its passthrough behaviour.
///
/// The message is copied verbatim, the timestamp is the record's fallback,
/// and the level is `unknown`. Used for empty and unrecognised pattern keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passthrough;

impl Steps for Passthrough {
    fn name(&self) -> &str {
        "default"
    }
}
