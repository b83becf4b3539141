//! Paginated read-side listing of credit requests.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::{error, info, warn};

use crate::domain::envelope::{CreditListResult, FORBIDDEN_MESSAGE};
use crate::domain::identity::{Credential, IdentityContext};
use crate::domain::ports::{CreditListingQuery, CreditStore, CredentialValidator};
use crate::domain::TraceId;

/// Listing service implementing [`CreditListingQuery`].
#[derive(Clone)]
pub struct CreditListingService {
    store: Arc<dyn CreditStore>,
    identity: IdentityContext,
    required_roles: BTreeSet<String>,
}

impl CreditListingService {
    /// Create a listing open to every caller.
    pub fn new(store: Arc<dyn CreditStore>, credentials: Arc<dyn CredentialValidator>) -> Self {
        Self {
            store,
            identity: IdentityContext::new(credentials),
            required_roles: BTreeSet::new(),
        }
    }

    /// Restrict the listing to callers holding at least one of `roles`.
    ///
    /// An empty set keeps the listing open.
    #[must_use]
    pub fn with_required_roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.required_roles = roles.into_iter().collect();
        self
    }
}

#[async_trait]
impl CreditListingQuery for CreditListingService {
    async fn list(
        &self,
        page_index: u32,
        page_size: u32,
        credential: &Credential,
    ) -> CreditListResult {
        let trace_id = TraceId::current_or_generate();
        info!(trace_id = %trace_id, page_index, page_size, "fetching credit listing");

        if !self.identity.has_any_role(credential, &self.required_roles) {
            warn!(trace_id = %trace_id, "caller lacks a role required for the listing");
            return CreditListResult::error(FORBIDDEN_MESSAGE);
        }
        let page = match PageRequest::new(page_index, page_size) {
            Ok(page) => page,
            Err(err) => return CreditListResult::error(err.to_string()),
        };

        match tokio::try_join!(
            self.store.count_all(),
            self.store.find_page(page.offset(), page.limit())
        ) {
            Ok((total, items)) => CreditListResult::ok(Page::new(total, items)),
            Err(err) => {
                error!(trace_id = %trace_id, error = %err, "credit listing failed");
                CreditListResult::error(err.to_string())
            }
        }
    }
}
