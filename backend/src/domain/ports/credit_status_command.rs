//! Driving port for approving or rejecting credit requests.
use async_trait::async_trait;

use crate::domain::{Credential, CreditRequestId, OutcomeEnvelope};

/// Driving port for manual credit decisions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditStatusCommand: Send + Sync {
    /// Approve (`approved == true`) or reject a stored credit request.
    ///
    /// A missing request yields an outcome whose failure kind is
    /// [`crate::domain::FailureKind::NotFound`].
    async fn update_status(
        &self,
        id: CreditRequestId,
        approved: bool,
        credential: &Credential,
    ) -> OutcomeEnvelope;
}
