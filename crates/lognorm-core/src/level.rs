//! Log severity levels and the keyword vocabulary used to recognise them.
//!
//! Producers spell levels in dozens of ways (`WARN`, `warning`, `wrn`, syslog
//! priority `4`, ...). [`LogLevel::from_keyword`] maps every spelling in the
//! static [`LEVEL_KEYWORDS`] table onto one canonical level.

use serde::{Deserialize, Serialize};

/// Log severity level, normalised across all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

/// Keyword vocabulary, keyed by lowercase spelling.
static LEVEL_KEYWORDS: phf::Map<&'static str, LogLevel> = phf::phf_map! {
    "trace" => LogLevel::Trace,
    "trc" => LogLevel::Trace,
    "debug" => LogLevel::Debug,
    "dbg" => LogLevel::Debug,
    "dbug" => LogLevel::Debug,
    "info" => LogLevel::Info,
    "inf" => LogLevel::Info,
    "information" => LogLevel::Info,
    "notice" => LogLevel::Info,
    "warn" => LogLevel::Warn,
    "wrn" => LogLevel::Warn,
    "warning" => LogLevel::Warn,
    "error" => LogLevel::Error,
    "err" => LogLevel::Error,
    "eror" => LogLevel::Error,
    "fatal" => LogLevel::Fatal,
    "crit" => LogLevel::Fatal,
    "critical" => LogLevel::Fatal,
    "panic" => LogLevel::Fatal,
    "emerg" => LogLevel::Fatal,
    "emergency" => LogLevel::Fatal,
    "alert" => LogLevel::Fatal,
    "severe" => LogLevel::Fatal,
    // syslog / journald priorities
    "0" => LogLevel::Fatal,
    "1" => LogLevel::Fatal,
    "2" => LogLevel::Fatal,
    "3" => LogLevel::Error,
    "4" => LogLevel::Warn,
    "5" => LogLevel::Info,
    "6" => LogLevel::Info,
    "7" => LogLevel::Debug,
};

impl LogLevel {
    /// Look up a level keyword, ignoring case and surrounding whitespace.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        if let Some(level) = LEVEL_KEYWORDS.get(keyword) {
            return Some(*level);
        }
        LEVEL_KEYWORDS
            .get(keyword.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Like [`from_keyword`](Self::from_keyword) but never fails.
    pub fn from_keyword_or_unknown(keyword: &str) -> Self {
        Self::from_keyword(keyword).unwrap_or(LogLevel::Unknown)
    }

    pub fn emoji(self) -> &'static str {
        match self {
            LogLevel::Trace => "🔬",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "ℹ️",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
            LogLevel::Fatal => "💀",
            LogLevel::Unknown => "❔",
        }
    }
}

impl From<String> for LogLevel {
    fn from(keyword: String) -> Self {
        Self::from_keyword_or_unknown(&keyword)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Fatal => write!(f, "fatal"),
            LogLevel::Unknown => write!(f, "unknown"),
        }
    }
}
