//! `serde_json` adapter for the `EventSerializer` port.

use crate::domain::OutboundEvent;
use crate::domain::ports::{EventSerializer, SerializationError};

/// Encodes events as compact JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventSerializer;

impl EventSerializer for JsonEventSerializer {
    fn encode(&self, event: &OutboundEvent) -> Result<String, SerializationError> {
        serde_json::to_string(event).map_err(|err| SerializationError::encode(err.to_string()))
    }
}
