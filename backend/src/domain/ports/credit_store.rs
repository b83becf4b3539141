//! Port for credit request persistence.
//!
//! The [`CreditStore`] owns the credit request records. Write methods return
//! the record as stored so callers observe store-assigned fields such as the
//! identifier.

use async_trait::async_trait;

use crate::domain::{CreditRequest, CreditRequestId, CreditState, CreditSummary, RequesterId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credit store adapters.
    pub enum CreditStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "credit store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "credit store query failed: {message}",
        /// The record breaks a field constraint.
        ConstraintViolation { violations: Vec<String> } =>
            "credit request violates constraints: {violations:?}",
    }
}

/// Durable storage for credit requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Insert a new record and return it with its assigned identifier.
    async fn create(&self, request: &CreditRequest) -> Result<CreditRequest, CreditStoreError>;

    /// Fetch a record by identifier.
    async fn find_by_id(
        &self,
        id: CreditRequestId,
    ) -> Result<Option<CreditRequest>, CreditStoreError>;

    /// Overwrite an existing record.
    async fn save(&self, request: &CreditRequest) -> Result<CreditRequest, CreditStoreError>;

    /// Every record belonging to a requester, in store order.
    async fn list_by_requester(
        &self,
        requester_id: RequesterId,
    ) -> Result<Vec<CreditRequest>, CreditStoreError>;

    /// Set the state of a record, returning `None` when it does not exist.
    async fn update_state(
        &self,
        id: CreditRequestId,
        state: CreditState,
    ) -> Result<Option<CreditRequest>, CreditStoreError>;

    /// Total number of records.
    async fn count_all(&self) -> Result<u64, CreditStoreError>;

    /// One page of listing rows.
    async fn find_page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<CreditSummary>, CreditStoreError>;
}
