//! Port resolving requesters by identity document.
use async_trait::async_trait;

use crate::domain::{DocumentNumber, RequesterId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by requester directory adapters.
    pub enum RequesterLookupError {
        /// The directory could not be reached.
        Connection { message: String } => "requester directory unavailable: {message}",
        /// The directory answered with something unusable.
        Query { message: String } => "requester directory query failed: {message}",
    }
}

/// Looks up the requester registered under a document number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequesterLookup: Send + Sync {
    /// Return the requester id, or `None` when nobody is registered.
    ///
    /// Adapters map a zero identifier from the directory to `None`.
    async fn find_by_document(
        &self,
        document: DocumentNumber,
    ) -> Result<Option<RequesterId>, RequesterLookupError>;
}
