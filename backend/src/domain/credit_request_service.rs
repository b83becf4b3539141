//! Credit request creation pipeline.
//!
//! [`CreditRequestService`] walks [`CREATE_STAGES`] over an
//! [`OutcomeEnvelope`]. Stages that short-circuit forward an earlier
//! rejection untouched; collaborator failures abort the walk and are
//! normalised once at the top. The capacity-checked variant additionally
//! hands a [`crate::domain::DebtCapacitySnapshot`] to the risk evaluator in
//! the background.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::domain::active_loans::ActiveLoanAggregator;
use crate::domain::dispatch::{ChannelKind, NotificationDispatcher};
use crate::domain::envelope::{
    Accepted, FailureKind, OutcomeEnvelope, REQUESTER_NOT_FOUND_MESSAGE,
};
use crate::domain::identity::{Credential, IdentityContext};
use crate::domain::pipeline::{
    CREATE_STAGES, CreateStage, ErrorMessagePolicy, OnPriorFailure, PipelineError,
};
use crate::domain::ports::{
    CreditRequestCommand, CreditStore, CredentialValidator, LoanTypeLookup, RequesterLookup,
};
use crate::domain::{CreditRequest, CreditState, OutboundEvent, TraceId};

/// Port bundle shared by the credit services.
#[derive(Clone)]
pub struct CreditPorts {
    /// Credential verification.
    pub credentials: Arc<dyn CredentialValidator>,
    /// Loan product catalogue.
    pub loan_types: Arc<dyn LoanTypeLookup>,
    /// Requester directory.
    pub requesters: Arc<dyn RequesterLookup>,
    /// Credit request storage.
    pub store: Arc<dyn CreditStore>,
    /// Outbound event dispatch.
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl CreditPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        credentials: Arc<dyn CredentialValidator>,
        loan_types: Arc<dyn LoanTypeLookup>,
        requesters: Arc<dyn RequesterLookup>,
        store: Arc<dyn CreditStore>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            credentials,
            loan_types,
            requesters,
            store,
            dispatcher,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Standard,
    CapacityChecked,
}

struct CallerClaims {
    email: String,
    declared_income: Option<Decimal>,
}

/// Credit request service implementing [`CreditRequestCommand`].
#[derive(Clone)]
pub struct CreditRequestService {
    identity: IdentityContext,
    loan_types: Arc<dyn LoanTypeLookup>,
    requesters: Arc<dyn RequesterLookup>,
    store: Arc<dyn CreditStore>,
    aggregator: ActiveLoanAggregator,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl CreditRequestService {
    /// Create the service over its ports.
    pub fn new(ports: CreditPorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            identity: IdentityContext::new(ports.credentials),
            loan_types: ports.loan_types,
            requesters: ports.requesters,
            aggregator: ActiveLoanAggregator::new(Arc::clone(&ports.store)),
            store: ports.store,
            dispatcher: ports.dispatcher,
            clock,
        }
    }

    async fn run(
        &self,
        request: CreditRequest,
        credential: &Credential,
        variant: Variant,
    ) -> OutcomeEnvelope {
        let trace_id = TraceId::current_or_generate();
        info!(
            trace_id = %trace_id,
            requester = %request.requester_id,
            capacity_check = variant == Variant::CapacityChecked,
            "credit request creation started"
        );
        let outcome = match TraceId::scope(
            trace_id,
            self.execute(request, credential, variant, trace_id),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(trace_id = %trace_id, error = %err, "credit request creation failed");
                OutcomeEnvelope::from(err.into_rejected(ErrorMessagePolicy::Normalized, None))
            }
        };
        info!(
            trace_id = %trace_id,
            status = ?outcome.status(),
            "credit request creation finished"
        );
        outcome
    }

    async fn execute(
        &self,
        request: CreditRequest,
        credential: &Credential,
        variant: Variant,
        trace_id: TraceId,
    ) -> Result<OutcomeEnvelope, PipelineError> {
        let claims = self.caller_claims(credential, variant)?;

        // Ownership is the first stage, so the seed status is overwritten
        // before anything reads it.
        let mut outcome = OutcomeEnvelope::from(Accepted::valid_user(request));
        for stage in CREATE_STAGES {
            if outcome.is_error() && stage.on_prior_failure() == OnPriorFailure::ShortCircuit {
                debug!(
                    trace_id = %trace_id,
                    stage = stage.name(),
                    "skipping stage after earlier failure"
                );
                continue;
            }
            outcome = self
                .run_stage(stage, outcome, credential, &claims, trace_id)
                .await?;
        }

        if let (Some(income), Ok(accepted)) = (claims.declared_income, outcome.as_result()) {
            self.request_capacity_evaluation(accepted.request().clone(), income, trace_id);
        }
        Ok(outcome)
    }

    fn caller_claims(
        &self,
        credential: &Credential,
        variant: Variant,
    ) -> Result<CallerClaims, PipelineError> {
        let email = self.identity.email(credential)?;
        let declared_income = match variant {
            Variant::Standard => None,
            Variant::CapacityChecked => Some(self.identity.declared_income(credential)?),
        };
        Ok(CallerClaims {
            email,
            declared_income,
        })
    }

    async fn run_stage(
        &self,
        stage: CreateStage,
        outcome: OutcomeEnvelope,
        credential: &Credential,
        claims: &CallerClaims,
        trace_id: TraceId,
    ) -> Result<OutcomeEnvelope, PipelineError> {
        let accepted = match outcome.into_result() {
            Ok(accepted) => accepted,
            Err(rejected) if stage == CreateStage::EmailStamping => {
                return Ok(stamp_email(rejected.into(), &claims.email));
            }
            Err(rejected) => return Ok(rejected.into()),
        };
        match stage {
            CreateStage::OwnershipCheck => Ok(self
                .identity
                .validate_ownership(accepted.into_request(), credential)?),
            CreateStage::LoanTypeValidation => {
                self.validate_loan_type(accepted.into_request(), trace_id)
                    .await
            }
            CreateStage::RequesterExistence => {
                self.resolve_requester(accepted.into_request(), trace_id)
                    .await
            }
            CreateStage::EmailStamping => Ok(stamp_email(accepted.into(), &claims.email)),
            CreateStage::Persistence => self.persist(accepted.into_request(), trace_id).await,
        }
    }

    async fn validate_loan_type(
        &self,
        mut request: CreditRequest,
        trace_id: TraceId,
    ) -> Result<OutcomeEnvelope, PipelineError> {
        info!(trace_id = %trace_id, loan_type = %request.loan_type_id, "resolving loan type");
        self.loan_types.resolve_by_id(request.loan_type_id).await?;
        request.state = Some(CreditState::PendingReview);
        Ok(Accepted::valid_type(request).into())
    }

    async fn resolve_requester(
        &self,
        mut request: CreditRequest,
        trace_id: TraceId,
    ) -> Result<OutcomeEnvelope, PipelineError> {
        info!(
            trace_id = %trace_id,
            document = %request.document_number,
            "resolving requester"
        );
        match self.requesters.find_by_document(request.document_number).await? {
            Some(requester_id) if requester_id.get() != 0 => {
                request.requester_id = requester_id;
                Ok(Accepted::valid_user(request).into())
            }
            _ => {
                warn!(trace_id = %trace_id, "no requester registered for document");
                Ok(OutcomeEnvelope::rejected(
                    FailureKind::RequesterNotFound,
                    REQUESTER_NOT_FOUND_MESSAGE,
                    Some(request),
                ))
            }
        }
    }

    async fn persist(
        &self,
        mut request: CreditRequest,
        trace_id: TraceId,
    ) -> Result<OutcomeEnvelope, PipelineError> {
        let violations = request.violations();
        if !violations.is_empty() {
            return Err(PipelineError::Validation(violations));
        }
        request.created_at = Some(self.clock.utc());
        let mut stored = self.store.create(&request).await?;
        // Stores are not required to keep the notification email.
        stored.notification_email = request.notification_email;
        info!(
            trace_id = %trace_id,
            request_id = ?stored.id,
            requester = %stored.requester_id,
            "credit request saved"
        );
        Ok(Accepted::ok(stored).into())
    }

    fn request_capacity_evaluation(&self, request: CreditRequest, income: Decimal, trace_id: TraceId) {
        let aggregator = self.aggregator.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let requested_at = self.clock.utc();
        self.dispatcher.spawn_detached(async move {
            match aggregator.compute_active_loans(request.requester_id).await {
                Ok(active_loans) => {
                    let snapshot = ActiveLoanAggregator::build_snapshot(
                        &request,
                        income,
                        active_loans,
                        requested_at,
                    );
                    dispatcher.emit(ChannelKind::Capacity, &OutboundEvent::DebtCapacity(snapshot));
                }
                Err(err) => warn!(
                    trace_id = %trace_id,
                    request_id = ?request.id,
                    error = %err,
                    "active loan aggregation failed; capacity evaluation skipped"
                ),
            }
        });
    }
}

fn stamp_email(mut outcome: OutcomeEnvelope, email: &str) -> OutcomeEnvelope {
    if let Some(request) = outcome.payload_mut() {
        request.notification_email = Some(email.to_owned());
    }
    outcome
}

#[async_trait]
impl CreditRequestCommand for CreditRequestService {
    async fn create(&self, request: CreditRequest, credential: &Credential) -> OutcomeEnvelope {
        self.run(request, credential, Variant::Standard).await
    }

    async fn create_with_capacity_check(
        &self,
        request: CreditRequest,
        credential: &Credential,
    ) -> OutcomeEnvelope {
        self.run(request, credential, Variant::CapacityChecked).await
    }
}

#[cfg(test)]
#[path = "credit_request_service_tests.rs"]
mod tests;
