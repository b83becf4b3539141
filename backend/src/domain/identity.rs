//! Caller identity checks built on the [`CredentialValidator`] port.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::domain::envelope::{Accepted, FailureKind, OutcomeEnvelope, UNAUTHORIZED_MESSAGE};
use crate::domain::ports::{CredentialError, CredentialValidator};
use crate::domain::CreditRequest;

/// Opaque bearer credential supplied by a caller.
///
/// The raw text is wiped from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wrap a raw credential.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Raw credential text for validators.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Reads caller identity, email, income and roles from credentials.
#[derive(Clone)]
pub struct IdentityContext {
    validator: Arc<dyn CredentialValidator>,
}

impl IdentityContext {
    /// Build a context over a credential validator.
    pub fn new(validator: Arc<dyn CredentialValidator>) -> Self {
        Self { validator }
    }

    /// Confirm the credential subject owns `request`.
    ///
    /// The subject is compared as text with the claimed requester id. A
    /// mismatch is a rejection that keeps the request as payload.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the subject cannot be read.
    pub fn validate_ownership(
        &self,
        request: CreditRequest,
        credential: &Credential,
    ) -> Result<OutcomeEnvelope, CredentialError> {
        let subject = self.validator.subject(credential.expose())?;
        if subject != request.requester_id.to_string() {
            warn!(
                claimed = %request.requester_id,
                "credential subject does not match the claimed requester"
            );
            return Ok(OutcomeEnvelope::rejected(
                FailureKind::Unauthorized,
                UNAUTHORIZED_MESSAGE,
                Some(request),
            ));
        }
        Ok(Accepted::valid_user(request).into())
    }

    /// Email of the credential subject.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] for malformed or unsigned credentials.
    pub fn email(&self, credential: &Credential) -> Result<String, CredentialError> {
        self.validator.email(credential.expose())
    }

    /// Income the credential subject declared.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] for malformed or unsigned credentials.
    pub fn declared_income(&self, credential: &Credential) -> Result<Decimal, CredentialError> {
        self.validator.declared_income(credential.expose())
    }

    /// Roles granted to the subject; empty when the credential is unusable.
    #[must_use]
    pub fn roles(&self, credential: &Credential) -> BTreeSet<String> {
        self.validator
            .roles(credential.expose())
            .unwrap_or_else(|error| {
                debug!(%error, "treating unreadable roles claim as empty");
                BTreeSet::new()
            })
    }

    /// True when `required` is empty or the subject holds one of its roles.
    #[must_use]
    pub fn has_any_role(&self, credential: &Credential, required: &BTreeSet<String>) -> bool {
        required.is_empty() || !self.roles(credential).is_disjoint(required)
    }
}
