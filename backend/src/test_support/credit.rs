//! Shared test doubles for the credit services.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{EventChannel, EventChannelError, EventSerializer, SerializationError};
use crate::domain::{
    DispatchConfig, EventChannels, NotificationDispatcher, OutboundEvent,
};

pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 24, 10, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

/// Channel double recording every published payload.
#[derive(Default)]
pub struct RecordingChannel {
    published: Mutex<Vec<String>>,
    failure: Option<EventChannelError>,
    delay: Option<Duration>,
}

impl RecordingChannel {
    pub fn failing(error: EventChannelError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<String> {
        self.published.lock().expect("channel lock").clone()
    }

    pub fn published_json(&self) -> Vec<serde_json::Value> {
        self.published()
            .iter()
            .map(|payload| serde_json::from_str(payload).expect("payload is JSON"))
            .collect()
    }
}

#[async_trait]
impl EventChannel for RecordingChannel {
    async fn publish(&self, payload: &str) -> Result<(), EventChannelError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.published
            .lock()
            .expect("channel lock")
            .push(payload.to_owned());
        Ok(())
    }
}

/// Serializer double producing plain JSON.
pub struct JsonSerializer;

impl EventSerializer for JsonSerializer {
    fn encode(&self, event: &OutboundEvent) -> Result<String, SerializationError> {
        serde_json::to_string(event).map_err(|err| SerializationError::encode(err.to_string()))
    }
}

/// Three recording channels wired into a dispatcher.
pub struct RecordingChannels {
    pub notification: Arc<RecordingChannel>,
    pub report: Arc<RecordingChannel>,
    pub capacity: Arc<RecordingChannel>,
}

impl Default for RecordingChannels {
    fn default() -> Self {
        Self {
            notification: Arc::new(RecordingChannel::default()),
            report: Arc::new(RecordingChannel::default()),
            capacity: Arc::new(RecordingChannel::default()),
        }
    }
}

impl RecordingChannels {
    pub fn with_notification(notification: RecordingChannel) -> Self {
        Self {
            notification: Arc::new(notification),
            ..Self::default()
        }
    }

    pub fn channels(&self) -> EventChannels {
        EventChannels {
            notification: self.notification.clone(),
            report: self.report.clone(),
            capacity: self.capacity.clone(),
        }
    }

    pub fn dispatcher(&self) -> Arc<NotificationDispatcher> {
        self.dispatcher_with(Arc::new(JsonSerializer), DispatchConfig::default())
    }

    pub fn dispatcher_with(
        &self,
        serializer: Arc<dyn EventSerializer>,
        config: DispatchConfig,
    ) -> Arc<NotificationDispatcher> {
        Arc::new(NotificationDispatcher::new(serializer, self.channels(), config))
    }
}
