//! Active loan aggregation feeding the debt-capacity evaluation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::ports::{CreditStore, CreditStoreError};
use crate::domain::{ActiveLoan, CreditRequest, DebtCapacitySnapshot, RequesterId};

/// Derives a requester's approved loans and the capacity snapshot built on
/// them.
#[derive(Clone)]
pub struct ActiveLoanAggregator {
    store: Arc<dyn CreditStore>,
}

impl ActiveLoanAggregator {
    /// Build an aggregator over the credit store.
    pub fn new(store: Arc<dyn CreditStore>) -> Self {
        Self { store }
    }

    /// Approved loans of `requester_id`, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`CreditStoreError`] when the requester's records cannot be
    /// listed.
    pub async fn compute_active_loans(
        &self,
        requester_id: RequesterId,
    ) -> Result<Vec<ActiveLoan>, CreditStoreError> {
        let records = self.store.list_by_requester(requester_id).await?;
        Ok(records
            .iter()
            .filter(|record| record.is_approved())
            .map(ActiveLoan::from)
            .collect())
    }

    /// Assemble the evaluation input for a persisted request.
    #[must_use]
    pub fn build_snapshot(
        request: &CreditRequest,
        declared_income: Decimal,
        active_loans: Vec<ActiveLoan>,
        requested_at: DateTime<Utc>,
    ) -> DebtCapacitySnapshot {
        DebtCapacitySnapshot {
            request_id: request.id,
            requester_id: request.requester_id,
            loan_type_id: request.loan_type_id,
            requested_amount: request.amount,
            term_months: request.term_months,
            monthly_rate: request.monthly_rate,
            declared_income,
            active_loans,
            requester_email: request.notification_email.clone(),
            requested_at,
        }
    }
}
