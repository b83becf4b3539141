//! Port resolving loan products in the remote catalogue.
use async_trait::async_trait;

use crate::domain::LoanTypeId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by loan type lookup adapters.
    pub enum LoanTypeLookupError {
        /// The catalogue has no product with this identifier.
        NotFound { loan_type_id: LoanTypeId } => "loan type {loan_type_id} not found",
        /// The catalogue could not be reached.
        Connection { message: String } => "loan type catalogue unavailable: {message}",
    }
}

/// Confirms that a loan product exists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanTypeLookup: Send + Sync {
    /// Resolve the product, returning its canonical identifier.
    async fn resolve_by_id(&self, id: LoanTypeId) -> Result<LoanTypeId, LoanTypeLookupError>;
}
