//! Broker-facing seams: the inbound message handle and the egress publisher.
//!
//! Publishing is two-phase, like a Kafka producer's `DeliveryFuture`:
//! [`Publisher::publish`] hands the payload to the broker client and returns
//! a [`PublishAck`] future that resolves once the broker has acknowledged
//! (or refused) the write. The pipeline waits on that future, with a
//! deadline, before it acknowledges the inbound message.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use thiserror::Error;

/// Broker acknowledgement of one publish.
pub type PublishAck = BoxFuture<'static, Result<(), PublishError>>;

/// A broker message being processed. Owned by the pipeline until one of
/// `ack`/`nack` has been called.
#[async_trait]
pub trait InboundMessage: Send + Sync + 'static {
    fn subject(&self) -> &str;

    fn headers(&self) -> &HashMap<String, String>;

    fn payload(&self) -> &[u8];

    /// Tell the broker the message is being worked on, postponing redelivery.
    async fn in_progress(&self) -> Result<(), BrokerError>;

    async fn ack(&self) -> Result<(), BrokerError>;

    /// Ask for redelivery after `delay`.
    async fn nack(&self, delay: Duration) -> Result<(), BrokerError>;
}

#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    /// Hand `payload` to the broker for `subject`.
    ///
    /// `Err` means the write never left the client; the returned future
    /// reports the broker's verdict on a write that did.
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<PublishAck, PublishError>;
}

/// Failure talking to the broker about an inbound message.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("broker transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publish rejected: {0}")]
    Rejected(String),
    #[error("entry could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no publish acknowledgement within {0:?}")]
    Timeout(Duration),
}
