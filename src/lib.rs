//! lognorm: log normalisation and delivery.
//!
//! Ingests heterogeneous log records from a broker, normalises each into one
//! canonical ECS-shaped schema and republishes it with at-least-once
//! guarantees. This crate re-exports the three layers so integration tests
//! and benches can import them from one place.
//!
//! # Architecture
//!
//! ```text
//! inbound message ──► Adapter ──► IntermediateRecord ──► Normalizer ──► EcsLogEntry
//!        ▲            (sources)                          (core)              │
//!        │                                                                   ▼
//!        └──────── ack / nack ◄──── DeliveryPipeline (delivery) ◄──── Publisher
//! ```

pub use lognorm_core;
pub use lognorm_delivery;
pub use lognorm_sources;

pub use lognorm_core::{EcsLogEntry, IntermediateRecord, LogLevel, Normalizer};
pub use lognorm_delivery::{DeliveryPipeline, DeliveryStats, PipelineOptions};
pub use lognorm_sources::Adapter;
