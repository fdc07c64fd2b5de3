//! Error taxonomy for lognorm-core.
//!
//! Only [`PatternError`] and [`StartupError`] are ever fatal, and only at
//! process start. Everything that can go wrong while normalising a single
//! record is annotated on the entry instead of being returned.

use thiserror::Error;

/// Errors raised while building or querying the pattern registry.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern {name:?} failed to compile: {source}")]
    Compile {
        name: String,
        #[source]
        source: Box<regex::Error>,
    },
    #[error("pattern {name:?} is already defined with a different grammar")]
    Conflict { name: String },
    #[error("pattern {name:?} references unknown pattern {reference:?}")]
    UnknownReference { name: String, reference: String },
    #[error("pattern {name:?} nests references too deeply (cycle?)")]
    RecursionLimit { name: String },
    #[error("no pattern named {0:?}")]
    NotFound(String),
}

/// Errors that prevent a [`Normalizer`](crate::Normalizer) from being built.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to compile the built-in pattern table")]
    Patterns(#[from] PatternError),
    #[error("strategy {strategy:?} references pattern {pattern:?}, which is not registered")]
    MissingPattern { strategy: String, pattern: String },
}
