//! Delivery pipeline: bounded intake, conversion, publish, ack resolution.
//!
//! ```text
//! PipelineHandle ──► mpsc(queue_capacity) ──► intake loop ──► Publisher::publish
//!                                                  │
//!                                                  └──► JoinSet of watchers
//!                                                        (ack | nack | timeout → nack)
//! ```
//!
//! Intake is one loop: it marks each message in progress, converts it,
//! serialises the entry and hands it to the publisher, strictly in queue
//! order. The broker's verdict is awaited by a watcher task per message so a
//! slow acknowledgement never holds up the next message.
//!
//! Every message gets exactly one terminal action: `ack` when the publish is
//! acknowledged, `nack(nack_delay)` on any failure or when no verdict arrives
//! within `ack_timeout` plus [`ACK_GRACE`]. A verdict future that panics
//! counts as a failure. A terminal action that panics leaves the message to
//! the broker's own redelivery and is counted as `unresolved`.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::{self, FutureExt};
use lognorm_core::{EcsLogEntry, Normalizer, RawMessage};
use lognorm_sources::Adapter;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::broker::{InboundMessage, PublishAck, PublishError, Publisher};

/// Added to the ack timeout before a watcher gives up. The broker client is
/// expected to resolve the publish itself within `ack_timeout`.
pub const ACK_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Produces the canonical entry for one inbound message.
pub trait Converter: Send + Sync {
    fn convert(&self, message: &RawMessage<'_>) -> EcsLogEntry;
}

/// An [`Adapter`] followed by a shared [`Normalizer`].
pub struct AdapterConverter<A> {
    adapter: A,
    normalizer: Arc<Normalizer>,
}

impl<A: Adapter> AdapterConverter<A> {
    pub fn new(adapter: A, normalizer: Arc<Normalizer>) -> Self {
        Self {
            adapter,
            normalizer,
        }
    }
}

impl<A: Adapter> Converter for AdapterConverter<A> {
    fn convert(&self, message: &RawMessage<'_>) -> EcsLogEntry {
        let record = self.adapter.convert(message);
        self.normalizer.normalize(&record)
    }
}

// ---------------------------------------------------------------------------
// Options / stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub egress_subject: String,
    pub ack_timeout: Duration,
    pub nack_delay: Duration,
    pub queue_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            egress_subject: "logs.normalized".to_string(),
            ack_timeout: Duration::from_secs(5),
            nack_delay: Duration::from_secs(1),
            queue_capacity: 4096,
        }
    }
}

/// Counters returned by [`DeliveryPipeline::run`]. `nacked` includes
/// `timed_out`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub received: u64,
    pub acked: u64,
    pub nacked: u64,
    pub timed_out: u64,
    /// Messages whose ack or nack never completed because the call panicked
    /// or the watcher died. The broker redelivers them once their ack wait
    /// runs out.
    pub unresolved: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Acked,
    Nacked,
    TimedOut,
    Unresolved,
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

struct DeliveryTask {
    message: Box<dyn InboundMessage>,
    converter: Arc<dyn Converter>,
}

/// Rejected submission. The message is handed back unresolved.
#[derive(Error)]
pub enum SubmitError {
    #[error("intake queue is full")]
    Full(Box<dyn InboundMessage>),
    #[error("delivery pipeline has shut down")]
    Closed(Box<dyn InboundMessage>),
}

impl SubmitError {
    pub fn into_message(self) -> Box<dyn InboundMessage> {
        match self {
            SubmitError::Full(message) | SubmitError::Closed(message) => message,
        }
    }
}

impl fmt::Debug for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (variant, message) = match self {
            SubmitError::Full(message) => ("Full", message),
            SubmitError::Closed(message) => ("Closed", message),
        };
        f.debug_tuple(variant).field(&message.subject()).finish()
    }
}

/// Submits messages to a running [`DeliveryPipeline`]. Intake closes once
/// every handle has been dropped.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<DeliveryTask>,
}

impl PipelineHandle {
    /// Queue `message`, waiting for room when the queue is full.
    pub async fn submit<M: InboundMessage>(
        &self,
        message: M,
        converter: Arc<dyn Converter>,
    ) -> Result<(), SubmitError> {
        let task = DeliveryTask {
            message: Box::new(message),
            converter,
        };
        self.tx
            .send(task)
            .await
            .map_err(|mpsc::error::SendError(task)| SubmitError::Closed(task.message))
    }

    /// Queue `message` only if there is room right now.
    pub fn try_submit<M: InboundMessage>(
        &self,
        message: M,
        converter: Arc<dyn Converter>,
    ) -> Result<(), SubmitError> {
        let task = DeliveryTask {
            message: Box::new(message),
            converter,
        };
        self.tx.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(task) => SubmitError::Full(task.message),
            mpsc::error::TrySendError::Closed(task) => SubmitError::Closed(task.message),
        })
    }

    /// Free queue slots right now.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct DeliveryPipeline {
    rx: mpsc::Receiver<DeliveryTask>,
    publisher: Arc<dyn Publisher>,
    options: PipelineOptions,
    watchers: JoinSet<Outcome>,
    stats: DeliveryStats,
}

impl DeliveryPipeline {
    pub fn new(publisher: Arc<dyn Publisher>, options: PipelineOptions) -> (Self, PipelineHandle) {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let pipeline = Self {
            rx,
            publisher,
            options,
            watchers: JoinSet::new(),
            stats: DeliveryStats::default(),
        };
        (pipeline, PipelineHandle { tx })
    }

    /// Process messages until intake closes, then wait for every outstanding
    /// watcher. Dropping the returned future aborts outstanding watchers.
    pub async fn run(mut self) -> DeliveryStats {
        while let Some(task) = self.rx.recv().await {
            self.stats.received += 1;
            self.process(task).await;
            while let Some(joined) = self.watchers.try_join_next() {
                self.record(joined);
            }
        }

        tracing::info!(outstanding = self.watchers.len(), "intake closed, draining watchers");
        while let Some(joined) = self.watchers.join_next().await {
            self.record(joined);
        }
        tracing::info!(
            received = self.stats.received,
            acked = self.stats.acked,
            nacked = self.stats.nacked,
            timed_out = self.stats.timed_out,
            unresolved = self.stats.unresolved,
            "delivery pipeline stopped"
        );
        self.stats
    }

    async fn process(&mut self, task: DeliveryTask) {
        let DeliveryTask { message, converter } = task;

        if let Err(err) = message.in_progress().await {
            tracing::warn!(subject = message.subject(), error = %err, "could not mark message in progress");
        }

        let entry = {
            let raw = RawMessage::new(message.subject(), message.headers(), message.payload());
            converter.convert(&raw)
        };

        let ack: PublishAck = match serde_json::to_vec(&entry) {
            Ok(payload) => {
                match self
                    .publisher
                    .publish(&self.options.egress_subject, Bytes::from(payload))
                    .await
                {
                    Ok(ack) => ack,
                    Err(err) => future::ready(Err(err)).boxed(),
                }
            }
            Err(err) => future::ready(Err(PublishError::from(err))).boxed(),
        };

        let deadline = self.options.ack_timeout + ACK_GRACE;
        self.watchers
            .spawn(resolve(message, ack, deadline, self.options.nack_delay));
    }

    fn record(&mut self, joined: Result<Outcome, JoinError>) {
        match joined {
            Ok(Outcome::Acked) => self.stats.acked += 1,
            Ok(Outcome::Nacked) => self.stats.nacked += 1,
            Ok(Outcome::TimedOut) => {
                self.stats.nacked += 1;
                self.stats.timed_out += 1;
            }
            Ok(Outcome::Unresolved) => self.stats.unresolved += 1,
            Err(err) => {
                tracing::error!(error = %err, "ack watcher did not complete");
                self.stats.unresolved += 1;
            }
        }
    }
}

/// Wait for the broker's verdict and apply the one terminal action.
async fn resolve(
    message: Box<dyn InboundMessage>,
    ack: PublishAck,
    deadline: Duration,
    nack_delay: Duration,
) -> Outcome {
    let verdict = AssertUnwindSafe(ack).catch_unwind();
    let outcome = match tokio::time::timeout(deadline, verdict).await {
        Ok(Ok(Ok(()))) => Outcome::Acked,
        Ok(Ok(Err(err))) => {
            tracing::error!(subject = message.subject(), error = %err, "publish failed, requesting redelivery");
            Outcome::Nacked
        }
        Ok(Err(panic)) => {
            tracing::error!(
                subject = message.subject(),
                panic = panic_message(&*panic),
                "publish acknowledgement panicked, requesting redelivery"
            );
            Outcome::Nacked
        }
        Err(_) => {
            tracing::warn!(
                subject = message.subject(),
                error = %PublishError::Timeout(deadline),
                "broker client never resolved the publish, requesting redelivery"
            );
            Outcome::TimedOut
        }
    };

    let action = async {
        match outcome {
            Outcome::Acked => message.ack().await,
            _ => message.nack(nack_delay).await,
        }
    };
    match AssertUnwindSafe(action).catch_unwind().await {
        Ok(Ok(())) => outcome,
        Ok(Err(err)) => {
            tracing::warn!(subject = message.subject(), error = %err, "could not resolve inbound message");
            outcome
        }
        Err(panic) => {
            tracing::error!(
                subject = message.subject(),
                panic = panic_message(&*panic),
                "resolving inbound message panicked, leaving it to broker redelivery"
            );
            Outcome::Unresolved
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
