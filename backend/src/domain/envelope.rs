//! Uniform outcome carried through the credit pipelines.
//!
//! [`OutcomeEnvelope`] wraps `Result<Accepted, Rejected>`: every stage either
//! advances an accepted request (updating its [`ResponseStatus`]) or forwards
//! a rejection. Callers receive the same shape whichever stage failed, and the
//! serialised form is the flat `{status, payload, error, failureKind}` object
//! clients expect.

use pagination::Page;
use serde::Serialize;

use crate::domain::{CreditRequest, CreditSummary};

/// Message returned when the credential subject does not own the request.
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized";
/// Message returned when no requester is registered for the document.
pub const REQUESTER_NOT_FOUND_MESSAGE: &str = "user not found";
/// Message returned for any failure the normalising policy hides.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "unexpected error";
/// Message returned when the caller lacks the roles a listing requires.
pub const FORBIDDEN_MESSAGE: &str = "forbidden";

/// Pipeline progress marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// The caller or requester was confirmed.
    ValidUser,
    /// The loan type was confirmed.
    ValidType,
    /// The pipeline completed.
    Ok,
    /// A stage failed; later short-circuiting stages do nothing.
    Error,
}

/// Category of a rejected outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credential subject does not match the claimed requester.
    Unauthorized,
    /// No requester is registered for the document.
    RequesterNotFound,
    /// The credit request to update does not exist.
    NotFound,
    /// Field constraints were violated.
    Validation,
    /// Anything else, including collaborator failures.
    Unexpected,
}

/// A request that passed every stage so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    status: ResponseStatus,
    request: CreditRequest,
}

impl Accepted {
    /// The caller or requester was confirmed.
    #[must_use]
    pub const fn valid_user(request: CreditRequest) -> Self {
        Self {
            status: ResponseStatus::ValidUser,
            request,
        }
    }

    /// The loan type was confirmed.
    #[must_use]
    pub const fn valid_type(request: CreditRequest) -> Self {
        Self {
            status: ResponseStatus::ValidType,
            request,
        }
    }

    /// The pipeline completed.
    #[must_use]
    pub const fn ok(request: CreditRequest) -> Self {
        Self {
            status: ResponseStatus::Ok,
            request,
        }
    }

    /// Progress marker; never [`ResponseStatus::Error`].
    #[must_use]
    pub const fn status(&self) -> ResponseStatus {
        self.status
    }

    /// The working record.
    #[must_use]
    pub const fn request(&self) -> &CreditRequest {
        &self.request
    }

    /// Take ownership of the working record.
    #[must_use]
    pub fn into_request(self) -> CreditRequest {
        self.request
    }
}

/// A failed outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    kind: FailureKind,
    message: String,
    request: Option<CreditRequest>,
}

impl Rejected {
    /// Build a rejection, optionally keeping the working record as payload.
    pub fn new(
        kind: FailureKind,
        message: impl Into<String>,
        request: Option<CreditRequest>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            request,
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Message returned to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Working record at the time of failure, when one was kept.
    #[must_use]
    pub const fn request(&self) -> Option<&CreditRequest> {
        self.request.as_ref()
    }
}

/// Uniform result of a credit pipeline.
///
/// # Examples
/// ```
/// use backend::domain::{CreditRequest, FailureKind, OutcomeEnvelope, ResponseStatus};
///
/// let envelope = OutcomeEnvelope::rejected(FailureKind::Unauthorized, "unauthorized", None);
/// assert_eq!(envelope.status(), ResponseStatus::Error);
/// assert_eq!(envelope.error_message(), Some("unauthorized"));
/// assert!(envelope.payload().is_none());
///
/// let envelope = OutcomeEnvelope::from(backend::domain::Accepted::ok(CreditRequest::default()));
/// assert!(!envelope.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "OutcomeEnvelopeDto")]
pub struct OutcomeEnvelope(Result<Accepted, Rejected>);

impl OutcomeEnvelope {
    /// Wrap a rejection.
    pub fn rejected(
        kind: FailureKind,
        message: impl Into<String>,
        request: Option<CreditRequest>,
    ) -> Self {
        Self(Err(Rejected::new(kind, message, request)))
    }

    /// Progress marker, [`ResponseStatus::Error`] for rejections.
    #[must_use]
    pub const fn status(&self) -> ResponseStatus {
        match &self.0 {
            Ok(accepted) => accepted.status,
            Err(_) => ResponseStatus::Error,
        }
    }

    /// Working record; absent only for some rejections.
    #[must_use]
    pub const fn payload(&self) -> Option<&CreditRequest> {
        match &self.0 {
            Ok(accepted) => Some(&accepted.request),
            Err(rejected) => rejected.request.as_ref(),
        }
    }

    /// Mutable access to the working record.
    pub fn payload_mut(&mut self) -> Option<&mut CreditRequest> {
        match &mut self.0 {
            Ok(accepted) => Some(&mut accepted.request),
            Err(rejected) => rejected.request.as_mut(),
        }
    }

    /// Caller-facing failure message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.0.as_ref().err().map(Rejected::message)
    }

    /// Failure category of a rejection.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.0.as_ref().err().map(Rejected::kind)
    }

    /// Whether the outcome is a rejection.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.0.is_err()
    }

    /// Whether the rejection reports a missing credit request.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.failure_kind() == Some(FailureKind::NotFound)
    }

    /// Borrow the underlying result.
    #[must_use]
    pub const fn as_result(&self) -> &Result<Accepted, Rejected> {
        &self.0
    }

    /// Take the underlying result.
    #[must_use]
    pub fn into_result(self) -> Result<Accepted, Rejected> {
        self.0
    }
}

impl From<Accepted> for OutcomeEnvelope {
    fn from(value: Accepted) -> Self {
        Self(Ok(value))
    }
}

impl From<Rejected> for OutcomeEnvelope {
    fn from(value: Rejected) -> Self {
        Self(Err(value))
    }
}

impl From<Result<Accepted, Rejected>> for OutcomeEnvelope {
    fn from(value: Result<Accepted, Rejected>) -> Self {
        Self(value)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeEnvelopeDto {
    status: ResponseStatus,
    payload: Option<CreditRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_kind: Option<FailureKind>,
}

impl From<OutcomeEnvelope> for OutcomeEnvelopeDto {
    fn from(value: OutcomeEnvelope) -> Self {
        match value.0 {
            Ok(accepted) => Self {
                status: accepted.status,
                payload: Some(accepted.request),
                error: None,
                failure_kind: None,
            },
            Err(rejected) => Self {
                status: ResponseStatus::Error,
                payload: rejected.request,
                error: Some(rejected.message),
                failure_kind: Some(rejected.kind),
            },
        }
    }
}

/// Result of a paginated credit listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditListResult {
    /// [`ResponseStatus::Ok`] or [`ResponseStatus::Error`].
    pub status: ResponseStatus,
    /// Total rows across every page; zero on error.
    pub total: u64,
    /// Rows of the requested page; empty on error.
    pub items: Vec<CreditSummary>,
    /// Failure message when `status` is [`ResponseStatus::Error`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreditListResult {
    /// Successful listing.
    #[must_use]
    pub fn ok(page: Page<CreditSummary>) -> Self {
        let (total, items) = page.into_parts();
        Self {
            status: ResponseStatus::Ok,
            total,
            items,
            error: None,
        }
    }

    /// Failed listing with no rows.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            total: 0,
            items: Vec::new(),
            error: Some(message.into()),
        }
    }
}
