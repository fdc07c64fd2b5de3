//! Pattern registry: grok-style named patterns compiled onto `regex`.
//!
//! A grammar is ordinary `regex` syntax plus references to other registered
//! patterns:
//!
//! | Reference            | Expands to                                    |
//! |----------------------|-----------------------------------------------|
//! | `%{NAME}`            | `(?:<grammar of NAME>)`                       |
//! | `%{NAME:label}`      | a capture reported under `label`              |
//! | `%{NAME:label:type}` | same as above, the type suffix is ignored     |
//!
//! `regex` does not allow two groups with the same name, so every labelled
//! reference gets a synthetic group name and the registry keeps the
//! group → label mapping. The same label may therefore appear in several
//! alternation branches; the first branch that participated in the match
//! wins.
//!
//! The registry is built once at startup by [`PatternRegistry::with_builtins`]
//! and shared by reference afterwards. It is never mutated while extraction
//! is running.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::PatternError;

/// Name of the composite "timestamp + level + message" pattern.
pub const TIMESTAMP_LEVEL_MESSAGE: &str = "TIMESTAMP_LEVEL_MESSAGE";
/// Name of the sidecar-proxy variant that also captures a worker thread id.
pub const SIDECAR_PROXY_LOG: &str = "SIDECAR_PROXY_LOG";

const MAX_DEPTH: usize = 32;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    // Constant input; cannot fail.
    Regex::new(r"%\{(\w+)(?::([\w.@\-]+))?(?::\w+)?\}").expect("reference syntax regex is valid")
});

// ---------------------------------------------------------------------------
// Built-in table
// ---------------------------------------------------------------------------

/// Built-in patterns, compiled in order. Later entries may reference earlier
/// ones only.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("WORD", r"\b\w+\b"),
    ("NOTSPACE", r"\S+"),
    ("SPACE", r"\s*"),
    ("DATA", r".*?"),
    ("GREEDYDATA", r".*"),
    ("INT", r"[+-]?[0-9]+"),
    ("POSINT", r"\b[1-9][0-9]*\b"),
    ("NUMBER", r"[+-]?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)"),
    ("BASE16NUM", r"(?:0[xX])?[0-9A-Fa-f]+"),
    ("UUID", r"[A-Fa-f0-9]{8}-(?:[A-Fa-f0-9]{4}-){3}[A-Fa-f0-9]{12}"),
    (
        "IPV4",
        r"(?:(?:25[0-5]|2[0-4][0-9]|1?[0-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1?[0-9]?[0-9])",
    ),
    ("IPV6", r"(?:[0-9A-Fa-f]{0,4}:){2,7}[0-9A-Fa-f]{0,4}"),
    ("IP", r"%{IPV6}|%{IPV4}"),
    (
        "HOSTNAME",
        r"\b[0-9A-Za-z][0-9A-Za-z-]{0,62}(?:\.[0-9A-Za-z][0-9A-Za-z-]{0,62})*\.?\b",
    ),
    ("IPORHOST", r"%{IP}|%{HOSTNAME}"),
    ("PATH", r"(?:/[^/\s]*)+"),
    ("YEAR", r"\d\d(?:\d\d)?"),
    ("MONTHNUM", r"0?[1-9]|1[0-2]"),
    ("MONTHDAY", r"0[1-9]|[12][0-9]|3[01]|[1-9]"),
    (
        "MONTH",
        r"\b(?:[Jj]an(?:uary)?|[Ff]eb(?:ruary)?|[Mm]ar(?:ch)?|[Aa]pr(?:il)?|[Mm]ay|[Jj]un(?:e)?|[Jj]ul(?:y)?|[Aa]ug(?:ust)?|[Ss]ep(?:tember)?|[Oo]ct(?:ober)?|[Nn]ov(?:ember)?|[Dd]ec(?:ember)?)\b",
    ),
    (
        "DAY",
        r"Mon(?:day)?|Tue(?:sday)?|Wed(?:nesday)?|Thu(?:rsday)?|Fri(?:day)?|Sat(?:urday)?|Sun(?:day)?",
    ),
    ("HOUR", r"2[0123]|[01]?[0-9]"),
    ("MINUTE", r"[0-5][0-9]"),
    ("SECOND", r"(?:[0-5]?[0-9]|60)(?:[:.,][0-9]+)?"),
    ("TIME", r"%{HOUR}:%{MINUTE}(?::%{SECOND})?"),
    ("ISO8601_TIMEZONE", r"Z|[+-]%{HOUR}(?::?%{MINUTE})"),
    (
        "TIMESTAMP_ISO8601",
        r"%{YEAR}-%{MONTHNUM}-%{MONTHDAY}[T ]%{HOUR}:?%{MINUTE}(?::?%{SECOND})?%{ISO8601_TIMEZONE}?",
    ),
    ("HTTPDATE", r"%{MONTHDAY}/%{MONTH}/%{YEAR}:%{TIME} %{INT}"),
    ("SYSLOGTIMESTAMP", r"%{MONTH} +%{MONTHDAY} %{TIME}"),
    // Domain additions.
    ("MULTILINE_MESSAGE", r"(?s:.*)"),
    // Log timestamps are narrower than the stock grok ones: two-digit
    // fields, four-digit years, and only forms `timestamp::LAYOUTS` parses.
    ("LOG_DATE", r"[0-9]{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12][0-9]|3[01])"),
    (
        "LOG_CLOCK",
        r"(?:[01][0-9]|2[0-3]):[0-5][0-9](?::[0-5][0-9](?:[.,][0-9]+)?)?",
    ),
    ("LOG_ZONE", r"Z|[+-](?:[01][0-9]|2[0-3])(?::?[0-5][0-9])?"),
    ("ISO_TIMESTAMP", r"%{LOG_DATE}[T ]%{LOG_CLOCK}(?:%{LOG_ZONE})?"),
    (
        "SLASH_TIMESTAMP",
        r"[0-9]{4}/(?:0[1-9]|1[0-2])/(?:0[1-9]|[12][0-9]|3[01])[T ]%{LOG_CLOCK}",
    ),
    (
        "LOG_HTTPDATE",
        r"(?:0[1-9]|[12][0-9]|3[01])/%{MONTH}/[0-9]{4}:(?:[01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9] [+-][0-9]{4}",
    ),
    (
        "LOG_TIMESTAMP",
        r"%{ISO_TIMESTAMP}|%{SLASH_TIMESTAMP}|%{LOG_HTTPDATE}",
    ),
    (
        "LOG_LEVEL",
        r"(?i:trace|trc|debug|dbug|dbg|information|info|inf|notice|warning|warn|wrn|error|eror|err|critical|crit|fatal|panic|emergency|emerg|alert|severe)\b",
    ),
    ("BRACKETED", r"[^\]]*"),
    (
        TIMESTAMP_LEVEL_MESSAGE,
        r#"^\s*%{LOG_TIMESTAMP:timestamp}\s+(?:\[%{LOG_LEVEL:level}\]|"%{LOG_LEVEL:level}"|%{LOG_LEVEL:level})\s*:?\s*%{MULTILINE_MESSAGE:message}$"#,
    ),
    (
        SIDECAR_PROXY_LOG,
        r"^\[%{LOG_TIMESTAMP:timestamp}\]\[%{INT:thread}\]\[%{LOG_LEVEL:level}\](?:\[%{BRACKETED:component}\])?\s*(?:\[%{BRACKETED:origin}\])?\s*%{MULTILINE_MESSAGE:message}$",
    ),
];

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

/// A grammar expanded and compiled into a single [`Regex`].
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    /// (synthetic group name, label) in order of appearance.
    groups: Vec<(String, String)>,
}

impl CompiledPattern {
    /// Match `text`, returning every labelled capture that participated.
    ///
    /// No match is not an error: the map is simply empty.
    pub fn captures(&self, text: &str) -> HashMap<String, String> {
        let mut out = HashMap::new();
        let Some(caps) = self.regex.captures(text) else {
            return out;
        };
        for (group, label) in &self.groups {
            if let Some(m) = caps.name(group) {
                out.entry(label.clone())
                    .or_insert_with(|| m.as_str().to_string());
            }
        }
        out
    }

    /// Labels this pattern can report, deduplicated, in order of appearance.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::with_capacity(self.groups.len());
        for (_, label) in &self.groups {
            if !labels.contains(&label.as_str()) {
                labels.push(label);
            }
        }
        labels
    }
}

/// One registered pattern.
#[derive(Debug, Clone)]
pub struct PatternDefinition {
    pub name: String,
    pub grammar: String,
    pub compiled: CompiledPattern,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name → definition map. One definition per name.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: HashMap<String, PatternDefinition>,
}

impl PatternRegistry {
    /// An empty registry. Most callers want [`with_builtins`](Self::with_builtins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the full built-in table. Any failure here is a startup error.
    pub fn with_builtins() -> Result<Self, PatternError> {
        let mut registry = Self::new();
        for (name, grammar) in BUILTIN_PATTERNS {
            registry.add(name, grammar)?;
        }
        tracing::info!(count = registry.len(), "compiled pattern registry");
        Ok(registry)
    }

    /// Register `grammar` under `name`.
    ///
    /// Re-adding the identical grammar is a no-op; a different grammar under
    /// an existing name is [`PatternError::Conflict`].
    pub fn add(&mut self, name: &str, grammar: &str) -> Result<(), PatternError> {
        if let Some(existing) = self.patterns.get(name) {
            if existing.grammar == grammar {
                return Ok(());
            }
            return Err(PatternError::Conflict {
                name: name.to_string(),
            });
        }
        let compiled = self.compile(name, grammar)?;
        self.patterns.insert(
            name.to_string(),
            PatternDefinition {
                name: name.to_string(),
                grammar: grammar.to_string(),
                compiled,
            },
        );
        Ok(())
    }

    /// Compile `grammar` against the patterns registered so far without
    /// registering it.
    pub fn compile(&self, name: &str, grammar: &str) -> Result<CompiledPattern, PatternError> {
        let mut groups = Vec::new();
        let expanded = self.expand(name, grammar, 0, &mut groups)?;
        let regex = Regex::new(&expanded).map_err(|source| PatternError::Compile {
            name: name.to_string(),
            source: Box::new(source),
        })?;
        Ok(CompiledPattern { regex, groups })
    }

    pub fn get(&self, name: &str) -> Result<&PatternDefinition, PatternError> {
        self.patterns
            .get(name)
            .ok_or_else(|| PatternError::NotFound(name.to_string()))
    }

    /// Match `text` against the pattern registered as `name`.
    ///
    /// Unknown `name` is [`PatternError::NotFound`]; no match is an empty map.
    pub fn matches(&self, name: &str, text: &str) -> Result<HashMap<String, String>, PatternError> {
        Ok(self.get(name)?.compiled.captures(text))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn expand(
        &self,
        name: &str,
        grammar: &str,
        depth: usize,
        groups: &mut Vec<(String, String)>,
    ) -> Result<String, PatternError> {
        if depth > MAX_DEPTH {
            return Err(PatternError::RecursionLimit {
                name: name.to_string(),
            });
        }

        let mut out = String::with_capacity(grammar.len());
        let mut last = 0;
        for caps in REFERENCE.captures_iter(grammar) {
            let (Some(whole), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&grammar[last..whole.start()]);

            let target = self.patterns.get(reference.as_str()).ok_or_else(|| {
                PatternError::UnknownReference {
                    name: name.to_string(),
                    reference: reference.as_str().to_string(),
                }
            })?;
            let inner = self.expand(name, &target.grammar, depth + 1, groups)?;

            match caps.get(2) {
                Some(label) => {
                    let group = format!("g{}", groups.len());
                    out.push_str(&format!("(?P<{group}>{inner})"));
                    groups.push((group, label.as_str().to_string()));
                }
                None => {
                    out.push_str("(?:");
                    out.push_str(&inner);
                    out.push(')');
                }
            }
            last = whole.end();
        }
        out.push_str(&grammar[last..]);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
