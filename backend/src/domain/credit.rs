//! Credit request records and the immutable projections derived from them.
//!
//! [`CreditRequest`] is the mutable working record threaded through the
//! orchestration pipelines. Everything else in this module is a read-only
//! projection: [`ActiveLoan`] and [`DebtCapacitySnapshot`] feed the external
//! risk evaluator, while [`StatusChangeEvent`] and [`ApprovedAmountEvent`] are
//! the outbound notification payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! define_numeric_id {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw numeric identifier.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Return the raw numeric identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_numeric_id!(
    /// Identifier assigned to a credit request by the store.
    CreditRequestId
);
define_numeric_id!(
    /// Identifier of the person requesting credit.
    RequesterId
);
define_numeric_id!(
    /// Identifier of a loan product (credit type).
    LoanTypeId
);
define_numeric_id!(
    /// National identity document number of a requester.
    DocumentNumber
);

/// Lifecycle state of a credit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditState {
    /// Accepted for processing, awaiting a decision.
    PendingReview,
    /// Granted; counts toward the requester's active loans.
    Approved,
    /// Declined.
    Rejected,
}

impl CreditState {
    /// State assigned by an approve/reject decision.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::CreditState;
    ///
    /// assert_eq!(CreditState::from_decision(true), CreditState::Approved);
    /// assert_eq!(CreditState::from_decision(false), CreditState::Rejected);
    /// ```
    #[must_use]
    pub const fn from_decision(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Rejected
        }
    }

    /// Stable snake_case label used in logs and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CreditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable working record for one credit request.
///
/// Pipeline stages mutate the record in place before persistence (state,
/// requester id, notification email). After persistence only the state and
/// the decision timestamp change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    /// Store-assigned identifier; `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CreditRequestId>,
    /// Requester the credit is for.
    pub requester_id: RequesterId,
    /// Requester's identity document.
    pub document_number: DocumentNumber,
    /// Requested principal.
    pub amount: Decimal,
    /// Repayment term in months.
    pub term_months: u32,
    /// Loan product.
    pub loan_type_id: LoanTypeId,
    /// Monthly interest rate, in percent.
    pub monthly_rate: Decimal,
    /// Lifecycle state; `None` before the loan type is validated.
    #[serde(default)]
    pub state: Option<CreditState>,
    /// When the request was first persisted.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the request was approved or rejected.
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    /// Address notified about state transitions.
    #[serde(default)]
    pub notification_email: Option<String>,
}

impl CreditRequest {
    /// Build an unsaved request from the caller-supplied loan terms.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{CreditRequest, DocumentNumber, LoanTypeId, RequesterId};
    /// use rust_decimal::Decimal;
    ///
    /// let request = CreditRequest::new(
    ///     RequesterId::new(1),
    ///     DocumentNumber::new(123_456),
    ///     LoanTypeId::new(2),
    ///     Decimal::new(1000, 0),
    ///     12,
    ///     Decimal::new(15, 1),
    /// );
    /// assert!(request.id.is_none());
    /// assert!(request.state.is_none());
    /// ```
    #[must_use]
    pub fn new(
        requester_id: RequesterId,
        document_number: DocumentNumber,
        loan_type_id: LoanTypeId,
        amount: Decimal,
        term_months: u32,
        monthly_rate: Decimal,
    ) -> Self {
        Self {
            requester_id,
            document_number,
            loan_type_id,
            amount,
            term_months,
            monthly_rate,
            ..Self::default()
        }
    }

    /// Field-level constraint violations, in declaration order.
    ///
    /// An empty list means the loan terms can be persisted.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.amount <= Decimal::ZERO {
            violations.push("amount must be greater than zero".to_owned());
        }
        if self.term_months == 0 {
            violations.push("term must be at least one month".to_owned());
        }
        if self.monthly_rate.is_sign_negative() {
            violations.push("monthly rate must not be negative".to_owned());
        }
        violations
    }

    /// Whether the request is in the approved state.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.state == Some(CreditState::Approved)
    }
}

/// A previously granted loan counted toward a requester's debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLoan {
    /// Identifier of the approved credit request.
    pub id: Option<CreditRequestId>,
    /// Granted principal.
    pub principal: Decimal,
    /// Repayment term in months.
    pub term_months: u32,
    /// Monthly interest rate, in percent.
    pub monthly_rate: Decimal,
}

impl From<&CreditRequest> for ActiveLoan {
    fn from(record: &CreditRequest) -> Self {
        Self {
            id: record.id,
            principal: record.amount,
            term_months: record.term_months,
            monthly_rate: record.monthly_rate,
        }
    }
}

/// Input to the external debt-capacity evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtCapacitySnapshot {
    /// Persisted request under evaluation.
    pub request_id: Option<CreditRequestId>,
    /// Requester the evaluation is for.
    pub requester_id: RequesterId,
    /// Requested loan product.
    pub loan_type_id: LoanTypeId,
    /// Requested principal.
    pub requested_amount: Decimal,
    /// Requested term in months.
    pub term_months: u32,
    /// Requested monthly interest rate.
    pub monthly_rate: Decimal,
    /// Income the requester declared in their credential.
    pub declared_income: Decimal,
    /// Loans already approved for the requester.
    pub active_loans: Vec<ActiveLoan>,
    /// Address that receives the evaluation outcome.
    pub requester_email: Option<String>,
    /// When the snapshot was taken.
    pub requested_at: DateTime<Utc>,
}

/// Notification sent whenever a request changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    /// Request whose state changed.
    pub request_id: Option<CreditRequestId>,
    /// New state.
    pub state: Option<CreditState>,
    /// Recipient address.
    pub email: Option<String>,
}

impl From<&CreditRequest> for StatusChangeEvent {
    fn from(request: &CreditRequest) -> Self {
        Self {
            request_id: request.id,
            state: request.state,
            email: request.notification_email.clone(),
        }
    }
}

/// Report entry emitted when a request is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedAmountEvent {
    /// Approved principal.
    pub approved_amount: Decimal,
}

impl From<&CreditRequest> for ApprovedAmountEvent {
    fn from(request: &CreditRequest) -> Self {
        Self {
            approved_amount: request.amount,
        }
    }
}

/// Every payload the core publishes to an outbound channel.
///
/// Serialises untagged so consumers receive the bare event object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    /// Requester-facing state change notification.
    StatusChange(StatusChangeEvent),
    /// Reporting entry for approved amounts.
    ApprovedAmount(ApprovedAmountEvent),
    /// Debt-capacity evaluation input.
    DebtCapacity(DebtCapacitySnapshot),
}

impl OutboundEvent {
    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StatusChange(_) => "status_change",
            Self::ApprovedAmount(_) => "approved_amount",
            Self::DebtCapacity(_) => "debt_capacity",
        }
    }
}

/// Row of the paginated credit listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    /// Applicant's full name.
    pub applicant_name: String,
    /// Applicant's email address.
    pub email: String,
    /// Requested principal.
    pub amount: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// Display name of the loan product.
    pub loan_type_name: String,
    /// Monthly interest rate.
    pub monthly_rate: Decimal,
    /// Applicant's base salary as recorded by the identity service.
    pub base_salary: Decimal,
    /// Current state, when known.
    pub state: Option<CreditState>,
}

/// Decision returned by the external debt-capacity evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityDecision {
    /// Request the decision applies to.
    pub request_id: CreditRequestId,
    /// State to record.
    pub state: CreditState,
}
