//! Timestamp normalizer: multi-layout parsing with a per-producer layout cache.
//!
//! [`TimestampNormalizer::parse`] first tries the layout that last worked for
//! the same producer identity (application name + version). A cached layout
//! that stops working is evicted and the full ordered search in [`LAYOUTS`]
//! runs again, so a wrong cache entry only ever costs one extra attempt.
//!
//! Layouts without a zone are read as UTC. No match is not an error: the
//! caller gets `None` and falls back to the record's fallback timestamp.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime};

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutKind {
    Rfc3339,
    Rfc2822,
    /// `chrono` format string including a zone offset.
    Zoned(&'static str),
    /// `chrono` format string without a zone; read as UTC.
    Naive(&'static str),
}

impl LayoutKind {
    fn parse(self, text: &str) -> Option<DateTime<FixedOffset>> {
        let parsed = match self {
            LayoutKind::Rfc3339 => DateTime::parse_from_rfc3339(text).ok(),
            LayoutKind::Rfc2822 => DateTime::parse_from_rfc2822(text).ok(),
            LayoutKind::Zoned(fmt) => DateTime::parse_from_str(text, fmt).ok(),
            LayoutKind::Naive(fmt) => NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(|naive| naive.and_utc().fixed_offset()),
        };
        parsed.filter(|ts| ts.year() > 1)
    }
}

/// One known timestamp layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub name: &'static str,
    kind: LayoutKind,
    /// Seconds and fraction are separated by `,` instead of `.`.
    comma_fraction: bool,
}

impl Layout {
    const fn new(name: &'static str, kind: LayoutKind) -> Self {
        Self {
            name,
            kind,
            comma_fraction: false,
        }
    }

    const fn comma(name: &'static str, kind: LayoutKind) -> Self {
        Self {
            name,
            kind,
            comma_fraction: true,
        }
    }

    /// Parse `text` with this layout only.
    pub fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        if self.comma_fraction {
            let (seconds, fraction) = text.split_once(',')?;
            return self.kind.parse(&format!("{seconds}.{fraction}"));
        }
        self.kind.parse(text)
    }
}

/// Known layouts, in search order.
///
/// `%.f` takes a fraction of any width or none, and `%#z` takes `Z`,
/// `+hh`, `+hhmm` or `+hh:mm`. Between them the table covers every
/// timestamp the `LOG_TIMESTAMP` pattern accepts.
pub const LAYOUTS: &[Layout] = &[
    Layout::new("rfc3339", LayoutKind::Rfc3339),
    Layout::new("iso8601-zoned", LayoutKind::Zoned("%Y-%m-%dT%H:%M:%S%.f%#z")),
    Layout::new("iso8601-naive", LayoutKind::Naive("%Y-%m-%dT%H:%M:%S%.f")),
    Layout::new("iso8601-minutes-zoned", LayoutKind::Zoned("%Y-%m-%dT%H:%M%#z")),
    Layout::new("iso8601-minutes", LayoutKind::Naive("%Y-%m-%dT%H:%M")),
    Layout::new("datetime-zoned", LayoutKind::Zoned("%Y-%m-%d %H:%M:%S%.f%#z")),
    Layout::new("datetime", LayoutKind::Naive("%Y-%m-%d %H:%M:%S%.f")),
    Layout::new("datetime-minutes-zoned", LayoutKind::Zoned("%Y-%m-%d %H:%M%#z")),
    Layout::new("datetime-minutes", LayoutKind::Naive("%Y-%m-%d %H:%M")),
    Layout::new("slash-datetime", LayoutKind::Naive("%Y/%m/%d %H:%M:%S%.f")),
    Layout::new("slash-iso", LayoutKind::Naive("%Y/%m/%dT%H:%M:%S%.f")),
    Layout::new("slash-minutes", LayoutKind::Naive("%Y/%m/%d %H:%M")),
    Layout::new("slash-iso-minutes", LayoutKind::Naive("%Y/%m/%dT%H:%M")),
    Layout::new("apache-combined", LayoutKind::Zoned("%d/%B/%Y:%H:%M:%S %z")),
    Layout::comma("comma-fraction-zoned", LayoutKind::Zoned("%Y-%m-%d %H:%M:%S%.f%#z")),
    Layout::comma("comma-fraction", LayoutKind::Naive("%Y-%m-%d %H:%M:%S%.f")),
    Layout::comma("iso8601-comma-zoned", LayoutKind::Zoned("%Y-%m-%dT%H:%M:%S%.f%#z")),
    Layout::comma("iso8601-comma", LayoutKind::Naive("%Y-%m-%dT%H:%M:%S%.f")),
    Layout::comma("slash-comma", LayoutKind::Naive("%Y/%m/%d %H:%M:%S%.f")),
    Layout::comma("slash-iso-comma", LayoutKind::Naive("%Y/%m/%dT%H:%M:%S%.f")),
    Layout::new("rfc2822", LayoutKind::Rfc2822),
    Layout::new("ansic", LayoutKind::Naive("%a %b %e %H:%M:%S %Y")),
    Layout::new("ruby-date", LayoutKind::Zoned("%a %b %d %H:%M:%S %z %Y")),
];

/// Try every layout in order; return the first hit and the layout that matched.
pub fn parse_uncached(text: &str) -> Option<(DateTime<FixedOffset>, &'static Layout)> {
    let text = text.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(text).map(|ts| (ts, layout)))
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Timestamp parser with a producer identity → last good layout cache.
///
/// Shared across concurrent extractions; the cache sits behind a mutex.
#[derive(Debug, Default)]
pub struct TimestampNormalizer {
    cache: Mutex<HashMap<String, &'static Layout>>,
}

impl TimestampNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` for `producer`. `None` means "timestamp unknown".
    pub fn parse(&self, producer: &str, text: &str) -> Option<DateTime<FixedOffset>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let cached = self.cache().get(producer).copied();
        if let Some(layout) = cached {
            if let Some(ts) = layout.parse(text) {
                return Some(ts);
            }
            tracing::debug!(producer, layout = layout.name, "cached timestamp layout stopped matching");
            self.cache().remove(producer);
        }

        let (ts, layout) = parse_uncached(text)?;
        self.cache().insert(producer.to_string(), layout);
        Some(ts)
    }

    /// Name of the layout currently cached for `producer`.
    pub fn cached_layout(&self, producer: &str) -> Option<&'static str> {
        self.cache().get(producer).map(|layout| layout.name)
    }

    pub fn forget(&self, producer: &str) {
        self.cache().remove(producer);
    }

    // A poisoned lock still holds a usable map; the worst case is a stale
    // layout, which evicts itself on the next miss.
    fn cache(&self) -> MutexGuard<'_, HashMap<String, &'static Layout>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
