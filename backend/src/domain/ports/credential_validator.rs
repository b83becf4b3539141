//! Port for verifying caller credentials and reading their claims.
//!
//! Credential parsing is CPU-bound and synchronous, so unlike the other
//! outbound ports this trait is not `async`.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use super::define_port_error;

define_port_error! {
    /// Errors raised while verifying a credential or reading a claim.
    pub enum CredentialError {
        /// The credential is malformed, unsigned or expired.
        InvalidCredential { message: String } => "invalid credential: {message}",
        /// The credential verified but lacks a required claim.
        MissingClaim { claim: String } => "credential is missing the {claim} claim",
    }
}

/// Verifies an opaque bearer credential and exposes its claims.
///
/// Every method verifies the credential independently; adapters may cache
/// decoded claims but callers must not rely on it.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialValidator: Send + Sync {
    /// Identifier of the authenticated subject, compared as text against the
    /// requester id a caller claims.
    fn subject(&self, credential: &str) -> Result<String, CredentialError>;

    /// Email address of the authenticated subject.
    fn email(&self, credential: &str) -> Result<String, CredentialError>;

    /// Income the subject declared to the identity service.
    fn declared_income(&self, credential: &str) -> Result<Decimal, CredentialError>;

    /// Role names granted to the subject.
    fn roles(&self, credential: &str) -> Result<BTreeSet<String>, CredentialError>;
}
