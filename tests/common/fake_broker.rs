//! In-memory broker fakes for delivery harnesses.
//!
//! [`FakeMessage`] records every `in_progress` / `ack` / `nack` call in a
//! shared [`Ledger`]; [`FakePublisher`] decides each publish's fate from the
//! published entry's `message` text.
//!
//! # Example
//!
//! ```rust,no_run
//! let ledger = Ledger::default();
//! let publisher = FakePublisher::new()
//!     .script("boom", Behaviour::Reject)
//!     .script("stuck", Behaviour::Hang);
//!
//! handle.submit(ledger.message("m-1", "boom"), converter).await?;
//! // ... drain the pipeline ...
//! assert_nacked("m-1", &ledger.actions("m-1"), nack_delay);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{self, FutureExt};
use lognorm_core::EcsLogEntry;
use lognorm_delivery::{BrokerError, InboundMessage, PublishAck, PublishError, Publisher};

// ---------------------------------------------------------------------------
// Inbound side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    InProgress,
    Ack,
    Nack(Duration),
}

impl Action {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Action::InProgress)
    }
}

/// Shared record of broker calls, keyed by message id.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    actions: Arc<Mutex<HashMap<String, Vec<Action>>>>,
}

impl Ledger {
    /// A message on `logs.container` whose payload is `payload`.
    pub fn message(&self, id: &str, payload: impl Into<Bytes>) -> FakeMessage {
        FakeMessage {
            id: id.to_string(),
            subject: "logs.container".to_string(),
            headers: HashMap::new(),
            payload: payload.into(),
            ledger: self.clone(),
        }
    }

    pub fn actions(&self, id: &str) -> Vec<Action> {
        self.actions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.actions.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn push(&self, id: &str, action: Action) {
        self.actions
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(action);
    }
}

pub struct FakeMessage {
    id: String,
    subject: String,
    headers: HashMap<String, String>,
    payload: Bytes,
    ledger: Ledger,
}

#[async_trait]
impl InboundMessage for FakeMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn in_progress(&self) -> Result<(), BrokerError> {
        self.ledger.push(&self.id, Action::InProgress);
        Ok(())
    }

    async fn ack(&self) -> Result<(), BrokerError> {
        self.ledger.push(&self.id, Action::Ack);
        Ok(())
    }

    async fn nack(&self, delay: Duration) -> Result<(), BrokerError> {
        self.ledger.push(&self.id, Action::Nack(delay));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outbound side
// ---------------------------------------------------------------------------

/// What the fake broker does with one publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Acknowledge immediately.
    Ack,
    /// Acknowledge after a delay.
    AckAfter(Duration),
    /// Accept the send, then reject the acknowledgement.
    Reject,
    /// Refuse the send outright.
    Refuse,
    /// Accept the send and never resolve the acknowledgement.
    Hang,
}

#[derive(Default)]
pub struct FakePublisher {
    script: HashMap<String, Behaviour>,
    published: Mutex<Vec<(String, EcsLogEntry)>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries whose message is `message` get `behaviour`; the rest are acked.
    pub fn script(mut self, message: &str, behaviour: Behaviour) -> Self {
        self.script.insert(message.to_string(), behaviour);
        self
    }

    /// `(subject, entry)` for every send the publisher accepted or refused.
    pub fn published(&self) -> Vec<(String, EcsLogEntry)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<PublishAck, PublishError> {
        let entry: EcsLogEntry = serde_json::from_slice(&payload)?;
        let behaviour = self
            .script
            .get(&entry.message)
            .copied()
            .unwrap_or(Behaviour::Ack);
        self.published
            .lock()
            .unwrap()
            .push((subject.to_string(), entry));

        match behaviour {
            Behaviour::Ack => Ok(future::ready(Ok(())).boxed()),
            Behaviour::AckAfter(delay) => Ok(tokio::time::sleep(delay).map(Ok).boxed()),
            Behaviour::Reject => {
                Ok(future::ready(Err(PublishError::Rejected("stream full".into()))).boxed())
            }
            Behaviour::Refuse => Err(PublishError::Rejected("connection closed".into())),
            Behaviour::Hang => Ok(future::pending().boxed()),
        }
    }
}
