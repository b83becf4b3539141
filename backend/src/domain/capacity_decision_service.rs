//! Applies debt-capacity decisions returned by the risk evaluator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::dispatch::{ChannelKind, NotificationDispatcher};
use crate::domain::ports::{CapacityDecisionCommand, CreditStore, CreditStoreError};
use crate::domain::{CapacityDecision, CreditRequest, Error, OutboundEvent, TraceId};

/// Capacity decision service implementing [`CapacityDecisionCommand`].
#[derive(Clone)]
pub struct CapacityDecisionService {
    store: Arc<dyn CreditStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl CapacityDecisionService {
    /// Create the service over the credit store and dispatcher.
    pub fn new(store: Arc<dyn CreditStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    fn map_store_error(error: CreditStoreError) -> Error {
        match error {
            CreditStoreError::Connection { message } => {
                Error::service_unavailable(format!("credit store unavailable: {message}"))
            }
            CreditStoreError::Query { message } => {
                Error::internal(format!("credit store error: {message}"))
            }
            CreditStoreError::ConstraintViolation { violations } => {
                Error::invalid_request(violations.join(", "))
            }
        }
    }

    async fn record(
        &self,
        decision: CapacityDecision,
        trace_id: TraceId,
    ) -> Result<CreditRequest, Error> {
        let updated = self
            .store
            .update_state(decision.request_id, decision.state)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| {
                warn!(
                    trace_id = %trace_id,
                    request_id = %decision.request_id,
                    "capacity decision for unknown credit request"
                );
                Error::not_found(format!("credit request {} not found", decision.request_id))
            })?;
        info!(
            trace_id = %trace_id,
            request_id = %decision.request_id,
            state = %decision.state,
            "capacity decision recorded"
        );

        if updated.is_approved() {
            self.dispatcher.emit(
                ChannelKind::Report,
                &OutboundEvent::ApprovedAmount((&updated).into()),
            );
        }
        self.dispatcher
            .emit_and_wait(
                ChannelKind::Notification,
                &OutboundEvent::StatusChange((&updated).into()),
            )
            .await;
        Ok(updated)
    }
}

#[async_trait]
impl CapacityDecisionCommand for CapacityDecisionService {
    async fn apply(&self, decision: CapacityDecision) -> Result<CreditRequest, Error> {
        let trace_id = TraceId::current_or_generate();
        TraceId::scope(trace_id, self.record(decision, trace_id)).await
    }
}
