//! Shared test utilities for lognorm integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The fakes are deterministic under `tokio::time::pause()`.
#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fake_broker;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fake_broker::*;
pub use fixtures::*;
