//! Driving port for submitting credit requests.
//!
//! Inbound adapters (HTTP handlers, message consumers) call
//! [`CreditRequestCommand`] with the caller's credential. Both operations
//! always answer with an [`OutcomeEnvelope`]; failures never escape as
//! errors.

use async_trait::async_trait;

use crate::domain::{Credential, CreditRequest, OutcomeEnvelope};

/// Driving port for credit request creation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditRequestCommand: Send + Sync {
    /// Validate and persist a credit request.
    async fn create(&self, request: CreditRequest, credential: &Credential) -> OutcomeEnvelope;

    /// Validate and persist a credit request, then ask the risk evaluator
    /// for a debt-capacity decision.
    ///
    /// The evaluation request is sent in the background and never changes
    /// the returned outcome.
    async fn create_with_capacity_check(
        &self,
        request: CreditRequest,
        credential: &Credential,
    ) -> OutcomeEnvelope;
}
