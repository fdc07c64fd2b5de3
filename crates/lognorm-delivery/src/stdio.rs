//! Line-oriented stand-in broker: stdin in, stdout out.
//!
//! Every input line becomes one [`LineMessage`]; the [`LinePublisher`] writes
//! one JSON document per line and reports the publish acknowledged once the
//! line has been flushed. There is no redelivery, so a `nack` is only logged.
//!
//! Lines are framed as raw bytes. Text decoding is the adapters' job, so a
//! line that is not valid UTF-8 is delivered like any other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{self, FutureExt};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

use crate::broker::{BrokerError, InboundMessage, PublishAck, PublishError, Publisher};
use crate::pipeline::{Converter, PipelineHandle};

/// Longest accepted input line; longer lines are skipped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

pub struct LineMessage {
    subject: String,
    headers: HashMap<String, String>,
    payload: Bytes,
    line_no: u64,
}

impl LineMessage {
    pub fn new(subject: &str, line_no: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.to_string(),
            headers: HashMap::new(),
            payload: payload.into(),
            line_no,
        }
    }
}

#[async_trait]
impl InboundMessage for LineMessage {
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
        Ok(())
    }

    async fn ack(&self) -> Result<(), BrokerError> {
        tracing::trace!(line = self.line_no, "line delivered");
        Ok(())
    }

    async fn nack(&self, _delay: Duration) -> Result<(), BrokerError> {
        tracing::warn!(line = self.line_no, "line could not be delivered and cannot be redelivered");
        Ok(())
    }
}

/// Writes each published payload as one line to `W`.
pub struct LinePublisher<W> {
    out: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send + 'static> LinePublisher<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> Publisher for LinePublisher<W> {
    async fn publish(&self, _subject: &str, payload: Bytes) -> Result<PublishAck, PublishError> {
        let mut out = self.out.lock().await;
        let written = async {
            out.write_all(&payload).await?;
            out.write_all(b"\n").await?;
            out.flush().await
        }
        .await;
        let verdict = written.map_err(|err| PublishError::Rejected(err.to_string()));
        Ok(future::ready(verdict).boxed())
    }
}

/// Submit every non-blank line of `input` on `subject` until EOF.
/// Returns the number of lines submitted.
pub async fn feed_lines<R>(
    input: R,
    subject: &str,
    handle: &PipelineHandle,
    converter: Arc<dyn Converter>,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_BYTES);
    let mut lines = FramedRead::new(input, codec);
    let mut line_no = 0u64;
    let mut submitted = 0u64;
    // After a codec error the stream yields `None` once before it resumes.
    let mut resuming = false;
    loop {
        let mut line = match lines.next().await {
            Some(Ok(line)) => line,
            Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                line_no += 1;
                tracing::warn!(line = line_no, max = MAX_LINE_BYTES, "skipping overlong line");
                resuming = true;
                continue;
            }
            Some(Err(AnyDelimiterCodecError::Io(err))) => return Err(err),
            None if resuming => {
                resuming = false;
                continue;
            }
            None => break,
        };
        resuming = false;
        line_no += 1;
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let message = LineMessage::new(subject, line_no, line);
        if let Err(err) = handle.submit(message, converter.clone()).await {
            tracing::error!(line = line_no, error = %err, "pipeline stopped accepting input");
            break;
        }
        submitted += 1;
    }
    Ok(submitted)
}
