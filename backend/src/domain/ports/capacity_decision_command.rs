//! Driving port for decisions returned by the risk evaluator.
use async_trait::async_trait;

use crate::domain::{CapacityDecision, CreditRequest, Error};

/// Driving port applying debt-capacity decisions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapacityDecisionCommand: Send + Sync {
    /// Record the decided state and notify the requester.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::NotFound`] when the request does
    /// not exist, and [`crate::domain::ErrorCode::ServiceUnavailable`] or
    /// [`crate::domain::ErrorCode::InternalError`] when the store fails.
    async fn apply(&self, decision: CapacityDecision) -> Result<CreditRequest, Error>;
}
