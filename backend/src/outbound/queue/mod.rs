//! In-process event channel adapters.
//!
//! [`TokioEventChannel`] hands serialised events to a bounded `tokio` mpsc
//! queue drained by the host, for example a broker forwarder or a test.
//! [`LoggingEventChannel`] discards events after logging them, for local runs
//! without a broker.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::ports::{EventChannel, EventChannelError};

/// Event channel backed by a bounded mpsc queue.
///
/// Publishing waits for queue capacity; the dispatcher's publish timeout
/// bounds that wait.
#[derive(Debug, Clone)]
pub struct TokioEventChannel {
    name: String,
    sender: mpsc::Sender<String>,
}

impl TokioEventChannel {
    /// Create a channel named `name` holding at most `capacity` events, with
    /// the receiving half the host drains.
    ///
    /// # Panics
    ///
    /// Panics when `capacity` is zero, as [`mpsc::channel`] does.
    pub fn bounded(name: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                name: name.into(),
                sender,
            },
            receiver,
        )
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl EventChannel for TokioEventChannel {
    async fn publish(&self, payload: &str) -> Result<(), EventChannelError> {
        self.sender
            .send(payload.to_owned())
            .await
            .map_err(|_| EventChannelError::unavailable(format!("{} queue is closed", self.name)))
    }
}

/// Event channel that logs and discards every event.
#[derive(Debug, Clone)]
pub struct LoggingEventChannel {
    name: String,
}

impl LoggingEventChannel {
    /// Create a discarding channel named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl EventChannel for LoggingEventChannel {
    async fn publish(&self, payload: &str) -> Result<(), EventChannelError> {
        tracing::warn!(
            channel = %self.name,
            payload,
            "event discarded (no broker configured)"
        );
        Ok(())
    }
}
