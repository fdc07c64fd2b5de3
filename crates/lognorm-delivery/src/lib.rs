//! lognorm-delivery: at-least-once delivery of normalised entries.
//!
//! [`broker`] holds the seams a concrete broker client implements,
//! [`pipeline`] the bounded intake and ack/nack resolution, and [`stdio`] a
//! line-oriented broker the `lognorm` binary runs on.

pub mod broker;
pub mod pipeline;
pub mod stdio;

pub use broker::{BrokerError, InboundMessage, PublishAck, PublishError, Publisher};
pub use pipeline::{
    AdapterConverter, Converter, DeliveryPipeline, DeliveryStats, PipelineHandle, PipelineOptions,
    SubmitError, ACK_GRACE,
};
