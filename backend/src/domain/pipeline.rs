//! Stage table and failure handling shared by the credit pipelines.
//!
//! The create pipeline walks [`CREATE_STAGES`] in order. Each stage declares,
//! through [`OnPriorFailure`], whether it still runs once an earlier stage
//! rejected the request. Exceptional failures raised by collaborators surface
//! as [`PipelineError`] and are turned into a rejection once, at the top of
//! the pipeline, by an [`ErrorMessagePolicy`].

use crate::domain::envelope::{FailureKind, Rejected, UNEXPECTED_ERROR_MESSAGE};
use crate::domain::ports::{
    CredentialError, CreditStoreError, LoanTypeLookupError, RequesterLookupError,
};
use crate::domain::{CreditRequest, CreditRequestId};

/// Exceptional failure raised inside a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The caller's credential could not be read.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// The loan type catalogue failed or does not know the product.
    #[error(transparent)]
    LoanType(#[from] LoanTypeLookupError),
    /// The requester directory failed.
    #[error(transparent)]
    Requester(#[from] RequesterLookupError),
    /// The credit store failed.
    #[error(transparent)]
    Store(#[from] CreditStoreError),
    /// Field constraints were violated.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    /// The credit request to update does not exist.
    #[error("credit request {0} not found")]
    NotFound(CreditRequestId),
}

impl PipelineError {
    /// Rejection category for this failure.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) | Self::Store(CreditStoreError::ConstraintViolation { .. }) => {
                FailureKind::Validation
            }
            Self::NotFound(_) => FailureKind::NotFound,
            _ => FailureKind::Unexpected,
        }
    }

    fn violations(&self) -> Option<&[String]> {
        match self {
            Self::Validation(violations)
            | Self::Store(CreditStoreError::ConstraintViolation { violations }) => {
                Some(violations.as_slice())
            }
            _ => None,
        }
    }

    /// Convert into a rejection, rendering the message with `policy`.
    #[must_use]
    pub fn into_rejected(
        self,
        policy: ErrorMessagePolicy,
        request: Option<CreditRequest>,
    ) -> Rejected {
        Rejected::new(self.failure_kind(), policy.render(&self), request)
    }
}

/// How an exceptional failure is rendered for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessagePolicy {
    /// Constraint violations are comma-joined; everything else becomes
    /// [`UNEXPECTED_ERROR_MESSAGE`].
    Normalized,
    /// The error's own text is returned verbatim.
    RawText,
}

impl ErrorMessagePolicy {
    /// Render `error` for the caller.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{ErrorMessagePolicy, PipelineError};
    ///
    /// let error = PipelineError::Validation(vec!["a".into(), "b".into()]);
    /// assert_eq!(ErrorMessagePolicy::Normalized.render(&error), "a, b");
    /// ```
    #[must_use]
    pub fn render(self, error: &PipelineError) -> String {
        match self {
            Self::Normalized => error.violations().map_or_else(
                || UNEXPECTED_ERROR_MESSAGE.to_owned(),
                |violations| violations.join(", "),
            ),
            Self::RawText => error.to_string(),
        }
    }
}

/// Whether a stage still runs after an earlier stage rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnPriorFailure {
    /// Forward the rejection unchanged.
    ShortCircuit,
    /// Run anyway.
    Run,
}

/// Stages of the create pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStage {
    /// Credential subject must match the claimed requester.
    OwnershipCheck,
    /// The loan product must exist.
    LoanTypeValidation,
    /// A requester must be registered for the document.
    RequesterExistence,
    /// The caller's email is attached to the payload.
    EmailStamping,
    /// Field validation then insertion.
    Persistence,
}

/// Execution order of the create pipeline.
pub const CREATE_STAGES: [CreateStage; 5] = [
    CreateStage::OwnershipCheck,
    CreateStage::LoanTypeValidation,
    CreateStage::RequesterExistence,
    CreateStage::EmailStamping,
    CreateStage::Persistence,
];

impl CreateStage {
    /// Behaviour once an earlier stage rejected the request.
    #[must_use]
    pub const fn on_prior_failure(self) -> OnPriorFailure {
        match self {
            Self::EmailStamping => OnPriorFailure::Run,
            Self::OwnershipCheck
            | Self::LoanTypeValidation
            | Self::RequesterExistence
            | Self::Persistence => OnPriorFailure::ShortCircuit,
        }
    }

    /// Label used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OwnershipCheck => "ownership_check",
            Self::LoanTypeValidation => "loan_type_validation",
            Self::RequesterExistence => "requester_existence",
            Self::EmailStamping => "email_stamping",
            Self::Persistence => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for message policies and the stage table.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::validation(PipelineError::Validation(vec!["amount must be greater than zero".into(), "term must be at least one month".into()]), "amount must be greater than zero, term must be at least one month")]
    #[case::store_constraint(PipelineError::Store(CreditStoreError::constraint_violation(vec!["x".to_owned()])), "x")]
    #[case::loan_type(PipelineError::LoanType(LoanTypeLookupError::not_found(3_u64)), UNEXPECTED_ERROR_MESSAGE)]
    #[case::store(PipelineError::Store(CreditStoreError::query("deadlock")), UNEXPECTED_ERROR_MESSAGE)]
    #[case::credential(PipelineError::Credential(CredentialError::invalid_credential("bad signature")), UNEXPECTED_ERROR_MESSAGE)]
    fn normalized_policy_hides_everything_but_violations(
        #[case] error: PipelineError,
        #[case] expected: &str,
    ) {
        assert_eq!(ErrorMessagePolicy::Normalized.render(&error), expected);
    }

    #[rstest]
    #[case(PipelineError::NotFound(CreditRequestId::new(4)), "credit request 4 not found")]
    #[case(PipelineError::Store(CreditStoreError::query("deadlock")), "credit store query failed: deadlock")]
    fn raw_text_policy_returns_error_text(#[case] error: PipelineError, #[case] expected: &str) {
        assert_eq!(ErrorMessagePolicy::RawText.render(&error), expected);
    }

    #[rstest]
    #[case(PipelineError::Validation(Vec::new()), FailureKind::Validation)]
    #[case(PipelineError::NotFound(CreditRequestId::new(1)), FailureKind::NotFound)]
    #[case(PipelineError::Requester(RequesterLookupError::connection("refused")), FailureKind::Unexpected)]
    fn failure_kind_classifies_errors(#[case] error: PipelineError, #[case] expected: FailureKind) {
        assert_eq!(error.failure_kind(), expected);
    }

    #[test]
    fn only_email_stamping_runs_after_a_failure() {
        let running: Vec<_> = CREATE_STAGES
            .into_iter()
            .filter(|stage| stage.on_prior_failure() == OnPriorFailure::Run)
            .collect();
        assert_eq!(running, vec![CreateStage::EmailStamping]);
    }

    #[test]
    fn ownership_check_runs_first_and_persistence_last() {
        assert_eq!(CREATE_STAGES.first(), Some(&CreateStage::OwnershipCheck));
        assert_eq!(CREATE_STAGES.last(), Some(&CreateStage::Persistence));
    }
}
