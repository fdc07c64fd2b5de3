//! `Normalizer`: the one object callers need to turn records into entries.
//!
//! Owns the compiled [`PatternRegistry`], the shared [`TimestampNormalizer`]
//! and the [`StrategyTable`]. Built once at startup and shared by reference
//! (or `Arc`) across every extraction; `normalize` only needs `&self`.

use crate::error::StartupError;
use crate::extract::{self, Context, Strategy, StrategyTable};
use crate::patterns::PatternRegistry;
use crate::timestamp::TimestampNormalizer;
use crate::types::{EcsLogEntry, IntermediateRecord};

#[derive(Debug)]
pub struct Normalizer {
    patterns: PatternRegistry,
    timestamps: TimestampNormalizer,
    strategies: StrategyTable,
}

impl Normalizer {
    /// Compile the built-in patterns and wire up the built-in strategies.
    pub fn new() -> Result<Self, StartupError> {
        Self::with_registry(PatternRegistry::with_builtins()?)
    }

    /// Use a caller-built registry. Every pattern a built-in strategy
    /// references must be present.
    pub fn with_registry(patterns: PatternRegistry) -> Result<Self, StartupError> {
        let normalizer = Self {
            patterns,
            timestamps: TimestampNormalizer::new(),
            strategies: StrategyTable::builtin(),
        };
        for (key, strategy) in normalizer.strategies.iter() {
            normalizer.check(key, strategy)?;
        }
        Ok(normalizer)
    }

    /// Route `key` to `strategy`, replacing any previous mapping.
    pub fn register(&mut self, key: &str, strategy: Strategy) -> Result<(), StartupError> {
        self.check(key, &strategy)?;
        self.strategies.insert(key, strategy);
        Ok(())
    }

    fn check(&self, key: &str, strategy: &Strategy) -> Result<(), StartupError> {
        match strategy.steps().pattern() {
            Some(pattern) if !self.patterns.contains(pattern) => Err(StartupError::MissingPattern {
                strategy: key.to_string(),
                pattern: pattern.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Normalise one record. Never fails; problems are annotated on the
    /// returned entry.
    pub fn normalize(&self, record: &IntermediateRecord) -> EcsLogEntry {
        let strategy = self.strategies.resolve(&record.pattern_key);
        let cx = Context::new(record, &self.patterns, &self.timestamps);
        extract::run(strategy, cx)
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    pub fn timestamps(&self) -> &TimestampNormalizer {
        &self.timestamps
    }
}
