//! Best-effort, detached emission of outbound events.
//!
//! Pipelines hand events to the [`NotificationDispatcher`] and move on: the
//! event is serialised up front and published from a spawned task whose
//! outcome is only logged. Hosts call [`NotificationDispatcher::flush`] at
//! shutdown to let in-flight publications finish.

use std::fmt;
use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::domain::ports::{EventChannel, EventChannelError, EventSerializer};
use crate::domain::{OutboundEvent, TraceId};

/// Publish timeout applied when none is configured.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Requester-facing state change notifications.
    Notification,
    /// Approved amount reporting.
    Report,
    /// Debt-capacity evaluation requests.
    Capacity,
}

impl ChannelKind {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Report => "report",
            Self::Capacity => "capacity",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three independent outbound channels.
#[derive(Clone)]
pub struct EventChannels {
    /// Receives [`OutboundEvent::StatusChange`] payloads.
    pub notification: Arc<dyn EventChannel>,
    /// Receives [`OutboundEvent::ApprovedAmount`] payloads.
    pub report: Arc<dyn EventChannel>,
    /// Receives [`OutboundEvent::DebtCapacity`] payloads.
    pub capacity: Arc<dyn EventChannel>,
}

impl EventChannels {
    fn get(&self, kind: ChannelKind) -> Arc<dyn EventChannel> {
        match kind {
            ChannelKind::Notification => Arc::clone(&self.notification),
            ChannelKind::Report => Arc::clone(&self.report),
            ChannelKind::Capacity => Arc::clone(&self.capacity),
        }
    }
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on a single publish attempt.
    pub publish_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

/// Serialises events and publishes them without gating the caller.
pub struct NotificationDispatcher {
    serializer: Arc<dyn EventSerializer>,
    channels: EventChannels,
    config: DispatchConfig,
    in_flight: Mutex<JoinSet<()>>,
}

impl NotificationDispatcher {
    /// Build a dispatcher over the given serializer and channels.
    pub fn new(
        serializer: Arc<dyn EventSerializer>,
        channels: EventChannels,
        config: DispatchConfig,
    ) -> Self {
        Self {
            serializer,
            channels,
            config,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    /// Serialise `event` and publish it from a detached task.
    ///
    /// Serialisation failures drop the event. Publication failures are
    /// logged by the task. Nothing is reported back to the caller.
    pub fn emit(&self, kind: ChannelKind, event: &OutboundEvent) {
        let Some(payload) = self.encode(kind, event) else {
            return;
        };
        self.spawn_detached(publish_owned(
            self.channels.get(kind),
            kind,
            payload,
            self.config.publish_timeout,
        ));
    }

    /// Serialise `event` and publish it, waiting for the attempt to finish.
    ///
    /// Failures are logged and swallowed exactly as for [`Self::emit`].
    pub async fn emit_and_wait(&self, kind: ChannelKind, event: &OutboundEvent) {
        let Some(payload) = self.encode(kind, event) else {
            return;
        };
        let channel = self.channels.get(kind);
        publish_logged(channel.as_ref(), kind, &payload, self.config.publish_timeout).await;
    }

    /// Run `work` in a detached task carrying the current trace id.
    ///
    /// The task is tracked so [`Self::flush`] waits for it.
    pub fn spawn_detached<Fut>(&self, work: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut in_flight = self.lock_in_flight();
        reap_finished(&mut in_flight);
        match TraceId::current() {
            Some(trace_id) => in_flight.spawn(TraceId::scope(trace_id, work)),
            None => in_flight.spawn(work),
        };
    }

    /// Wait for every tracked task, including tasks they spawn meanwhile.
    pub async fn flush(&self) {
        loop {
            let mut pending = mem::take(&mut *self.lock_in_flight());
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                log_join_failure(result);
            }
        }
    }

    /// Number of tracked tasks that have not finished yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let mut in_flight = self.lock_in_flight();
        reap_finished(&mut in_flight);
        in_flight.len()
    }

    fn encode(&self, kind: ChannelKind, event: &OutboundEvent) -> Option<String> {
        match self.serializer.encode(event) {
            Ok(payload) => Some(payload),
            Err(error) => {
                debug!(
                    channel = kind.as_str(),
                    event = event.kind(),
                    %error,
                    "dropping event that could not be serialised"
                );
                None
            }
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NotificationDispatcher {
    // Dropping a `JoinSet` aborts its tasks; publications already handed
    // off must still run.
    fn drop(&mut self) {
        self.in_flight
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .detach_all();
    }
}

fn reap_finished(in_flight: &mut JoinSet<()>) {
    while let Some(result) = in_flight.try_join_next() {
        log_join_failure(result);
    }
}

fn log_join_failure(result: Result<(), JoinError>) {
    if let Err(error) = result {
        warn!(%error, "detached dispatch task did not complete");
    }
}

/// Publish `payload` on `channel` from a detached task.
///
/// The attempt is bounded by `timeout`; its outcome is logged and never
/// returned. `trace_id` is re-scoped into the task so its log events stay
/// correlated with the pipeline that emitted them.
pub fn dispatch_best_effort(
    channel: Arc<dyn EventChannel>,
    kind: ChannelKind,
    payload: String,
    timeout: Duration,
    trace_id: Option<TraceId>,
) -> JoinHandle<()> {
    let task = publish_owned(channel, kind, payload, timeout);
    match trace_id {
        Some(trace_id) => trace_id.spawn(task),
        None => tokio::spawn(task),
    }
}

async fn publish_owned(
    channel: Arc<dyn EventChannel>,
    kind: ChannelKind,
    payload: String,
    timeout: Duration,
) {
    publish_logged(channel.as_ref(), kind, &payload, timeout).await;
}

async fn publish_logged(channel: &dyn EventChannel, kind: ChannelKind, payload: &str, timeout: Duration) {
    let trace_id = TraceId::current().map(|id| id.to_string()).unwrap_or_default();
    match publish_bounded(channel, payload, timeout).await {
        Ok(()) => debug!(channel = kind.as_str(), trace_id = %trace_id, "event published"),
        Err(error) => warn!(
            channel = kind.as_str(),
            trace_id = %trace_id,
            %error,
            "event publish failed"
        ),
    }
}

async fn publish_bounded(
    channel: &dyn EventChannel,
    payload: &str,
    timeout: Duration,
) -> Result<(), EventChannelError> {
    match tokio::time::timeout(timeout, channel.publish(payload)).await {
        Ok(result) => result,
        Err(_) => Err(EventChannelError::timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
