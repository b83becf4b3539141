//! Driving port for the paginated credit listing.
use async_trait::async_trait;

use crate::domain::{Credential, CreditListResult};

/// Driving port for listing credit requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditListingQuery: Send + Sync {
    /// Return one page of credit summaries together with the total count.
    async fn list(
        &self,
        page_index: u32,
        page_size: u32,
        credential: &Credential,
    ) -> CreditListResult;
}
