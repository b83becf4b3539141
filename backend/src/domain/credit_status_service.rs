//! Manual approve/reject pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info};

use crate::domain::credit_request_service::CreditPorts;
use crate::domain::dispatch::{ChannelKind, NotificationDispatcher};
use crate::domain::envelope::{Accepted, OutcomeEnvelope};
use crate::domain::identity::{Credential, IdentityContext};
use crate::domain::pipeline::{ErrorMessagePolicy, PipelineError};
use crate::domain::ports::{CreditStatusCommand, CreditStore};
use crate::domain::{CreditRequestId, CreditState, OutboundEvent, TraceId};

/// Credit status service implementing [`CreditStatusCommand`].
///
/// Failures are reported with their raw text, unlike creation which hides
/// everything but constraint violations.
#[derive(Clone)]
pub struct CreditStatusService {
    identity: IdentityContext,
    store: Arc<dyn CreditStore>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl CreditStatusService {
    /// Create the service over its ports.
    pub fn new(ports: CreditPorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            identity: IdentityContext::new(ports.credentials),
            store: ports.store,
            dispatcher: ports.dispatcher,
            clock,
        }
    }

    async fn execute(
        &self,
        id: CreditRequestId,
        approved: bool,
        credential: &Credential,
        trace_id: TraceId,
    ) -> Result<OutcomeEnvelope, PipelineError> {
        let state = CreditState::from_decision(approved);
        let email = self.identity.email(credential)?;

        let mut request = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(PipelineError::NotFound(id))?;
        request.state = Some(state);
        request.decided_at = Some(self.clock.utc());
        let mut stored = self.store.save(&request).await?;
        stored.notification_email = Some(email);
        info!(trace_id = %trace_id, request_id = %id, %state, "credit request decided");

        if stored.is_approved() {
            self.dispatcher
                .emit(ChannelKind::Report, &OutboundEvent::ApprovedAmount((&stored).into()));
        }
        self.dispatcher
            .emit(ChannelKind::Notification, &OutboundEvent::StatusChange((&stored).into()));

        Ok(Accepted::ok(stored).into())
    }
}

#[async_trait]
impl CreditStatusCommand for CreditStatusService {
    async fn update_status(
        &self,
        id: CreditRequestId,
        approved: bool,
        credential: &Credential,
    ) -> OutcomeEnvelope {
        let trace_id = TraceId::current_or_generate();
        info!(trace_id = %trace_id, request_id = %id, approved, "credit status update started");
        match TraceId::scope(trace_id, self.execute(id, approved, credential, trace_id)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(trace_id = %trace_id, request_id = %id, error = %err, "credit status update failed");
                err.into_rejected(ErrorMessagePolicy::RawText, None).into()
            }
        }
    }
}

#[cfg(test)]
#[path = "credit_status_service_tests.rs"]
mod tests;
