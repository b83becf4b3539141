//! Port encoding outbound events for transport.
use crate::domain::OutboundEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised while encoding an event.
    pub enum SerializationError {
        /// The event could not be encoded.
        Encode { message: String } => "event encoding failed: {message}",
    }
}

/// Encodes events into the textual form carried by [`super::EventChannel`].
#[cfg_attr(test, mockall::automock)]
pub trait EventSerializer: Send + Sync {
    /// Encode one event.
    fn encode(&self, event: &OutboundEvent) -> Result<String, SerializationError>;
}
