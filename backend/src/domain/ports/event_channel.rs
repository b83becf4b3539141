//! Port describing an outbound message channel.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by event channel adapters.
    pub enum EventChannelError {
        /// Channel infrastructure is unavailable.
        Unavailable { message: String } => "event channel is unavailable: {message}",
        /// The message could not be acknowledged.
        Rejected { message: String } => "event was rejected: {message}",
        /// Publishing did not finish in time.
        Timeout { millis: u64 } => "event publish timed out after {millis} ms",
    }
}

/// Destination for serialised outbound events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Publish one serialised event.
    async fn publish(&self, payload: &str) -> Result<(), EventChannelError>;
}
