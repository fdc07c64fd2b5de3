//! Key-value decoder: tolerant scanner for flat `key=value` (logfmt) text.
//!
//! Values are either bare (terminated by whitespace) or double-quoted
//! (terminated by the next unescaped `"`, may span lines). Nothing is ever
//! rejected outright:
//!
//! - text that is not a `key=value` token is collected, space-joined, under
//!   [`TRASH_KEY`];
//! - input without a single valid token becomes one free-text
//!   [`MESSAGE_KEY`] value;
//! - a repeated `msg`/`message` key is concatenated, any other repeated key
//!   is overwritten (last write wins).
//!
//! Every one of these cases is still reported through the returned
//! [`DecodeError`] so callers know the input was not clean logfmt.

use std::collections::HashMap;

use thiserror::Error;

/// Key that collects unparseable fragments.
pub const TRASH_KEY: &str = "trash";
/// Key used when the whole input is free text.
pub const MESSAGE_KEY: &str = "message";

/// One way in which the input was not well-formed key-value text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeIssue {
    #[error("unparseable text {0:?}")]
    Trash(String),
    #[error("key {0:?} given more than once, last value kept")]
    DuplicateKey(String),
    #[error("unterminated quoted value for key {0:?}")]
    UnterminatedQuote(String),
    #[error("no key=value pairs found")]
    NoPairs,
}

/// Everything that was not well-formed about one decoded input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed key-value text: {}", join_issues(.issues))]
pub struct DecodeError {
    pub issues: Vec<DecodeIssue>,
}

fn join_issues(issues: &[DecodeIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode `text`. The map always holds every valid pair found, even when an
/// error is returned alongside it.
pub fn decode(text: &str) -> (HashMap<String, String>, Option<DecodeError>) {
    let mut scanner = Scanner::new(text);
    scanner.run();
    scanner.finish()
}

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace()
}

fn is_message_key(key: &str) -> bool {
    key == MESSAGE_KEY || key == "msg"
}

/// Byte-oriented scanner. Every delimiter it looks for is ASCII, so slicing
/// at those positions always lands on a char boundary.
struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    pairs: HashMap<String, String>,
    trash: Vec<&'a str>,
    issues: Vec<DecodeIssue>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            pairs: HashMap::new(),
            trash: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn run(&mut self) {
        loop {
            self.skip_space();
            if self.pos >= self.bytes.len() {
                break;
            }
            self.token();
        }
    }

    fn skip_space(&mut self) {
        while self.pos < self.bytes.len() && is_space(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn skip_word(&mut self) {
        while self.pos < self.bytes.len() && !is_space(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn token(&mut self) {
        let text = self.text;
        let start = self.pos;
        while self.pos < self.bytes.len()
            && !is_space(self.bytes[self.pos])
            && self.bytes[self.pos] != b'='
        {
            self.pos += 1;
        }
        let key = &text[start..self.pos];

        let at_equals = self.pos < self.bytes.len() && self.bytes[self.pos] == b'=';
        if !at_equals || key.is_empty() {
            // bare word, or `=value` without a key
            self.skip_word();
            self.trash.push(&text[start..self.pos]);
            return;
        }

        self.pos += 1;
        let value = if self.pos < self.bytes.len() && self.bytes[self.pos] == b'"' {
            self.pos += 1;
            self.quoted(key)
        } else {
            let value_start = self.pos;
            self.skip_word();
            text[value_start..self.pos].to_string()
        };
        self.insert(key, value);
    }

    /// Read a quoted value; `pos` is just past the opening quote.
    fn quoted(&mut self, key: &str) -> String {
        let mut value = String::new();
        let mut segment = self.pos;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'"' => {
                    value.push_str(&self.text[segment..self.pos]);
                    self.pos += 1;
                    return value;
                }
                b'\\' if self.pos + 1 < self.bytes.len() => {
                    value.push_str(&self.text[segment..self.pos]);
                    let unescaped = match self.bytes[self.pos + 1] {
                        b'"' => Some('"'),
                        b'\\' => Some('\\'),
                        b'n' => Some('\n'),
                        b't' => Some('\t'),
                        b'r' => Some('\r'),
                        _ => None,
                    };
                    match unescaped {
                        Some(c) => {
                            value.push(c);
                            self.pos += 2;
                        }
                        None => {
                            value.push('\\');
                            self.pos += 1;
                        }
                    }
                    segment = self.pos;
                }
                _ => self.pos += 1,
            }
        }
        value.push_str(&self.text[segment..]);
        self.issues
            .push(DecodeIssue::UnterminatedQuote(key.to_string()));
        value
    }

    fn insert(&mut self, key: &str, value: String) {
        match self.pairs.get_mut(key) {
            Some(existing) if is_message_key(key) => append_spaced(existing, &value),
            Some(existing) => {
                *existing = value;
                self.issues.push(DecodeIssue::DuplicateKey(key.to_string()));
            }
            None => {
                self.pairs.insert(key.to_string(), value);
            }
        }
    }

    fn finish(mut self) -> (HashMap<String, String>, Option<DecodeError>) {
        if self.pairs.is_empty() {
            let free_text = self.text.trim();
            if !free_text.is_empty() {
                self.pairs
                    .insert(MESSAGE_KEY.to_string(), free_text.to_string());
                self.issues.push(DecodeIssue::NoPairs);
            }
        } else if !self.trash.is_empty() {
            let trash = self.trash.join(" ");
            append_spaced(
                self.pairs.entry(TRASH_KEY.to_string()).or_default(),
                &trash,
            );
            self.issues.push(DecodeIssue::Trash(trash));
        }

        let error = if self.issues.is_empty() {
            None
        } else {
            Some(DecodeError {
                issues: self.issues,
            })
        };
        (self.pairs, error)
    }
}

fn append_spaced(existing: &mut String, more: &str) {
    if more.is_empty() {
        return;
    }
    if !existing.is_empty() {
        existing.push(' ');
    }
    existing.push_str(more);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
