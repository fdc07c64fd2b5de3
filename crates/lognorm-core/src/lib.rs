//! lognorm-core: log normalisation engine.
//!
//! Turns adapter-produced [`IntermediateRecord`]s into canonical
//! [`EcsLogEntry`] documents.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──► PatternRegistry     (grok-style matching)
//! IntermediateRecord ──►│──► logfmt::decode      (key-value text)
//!     Normalizer        └──► TimestampNormalizer (layout cache)
//!         │
//!         └──► extract: strategy steps ──► validate ──► EcsLogEntry
//! ```
//!
//! The registry and strategy table are immutable after startup. The
//! timestamp layout cache is the only shared mutable state.

pub mod config;
pub mod error;
pub mod extract;
pub mod labels;
pub mod level;
pub mod logfmt;
pub mod normalizer;
pub mod patterns;
pub mod timestamp;
pub mod types;
pub mod validate;

pub use error::{PatternError, StartupError};
pub use level::LogLevel;
pub use normalizer::Normalizer;
pub use types::{EcsLogEntry, IntermediateRecord, ProcessError, RawMessage, UnmarshalFailure};
