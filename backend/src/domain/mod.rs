//! Credit request domain: records, pipelines and ports.
//!
//! Purpose: orchestrate credit request creation, manual decisions,
//! capacity decisions and listing behind narrow ports, returning a uniform
//! [`OutcomeEnvelope`] whichever stage failed.
//!
//! Public surface:
//! - [`CreditRequest`] and its projections ([`ActiveLoan`],
//!   [`DebtCapacitySnapshot`], [`OutboundEvent`], [`CreditSummary`]).
//! - [`OutcomeEnvelope`] and [`CreditListResult`], the caller-facing results.
//! - The services [`CreditRequestService`], [`CreditStatusService`],
//!   [`CreditListingService`] and [`CapacityDecisionService`].
//! - [`NotificationDispatcher`], the best-effort outbound side channel.
//! - [`Error`] and [`ErrorCode`] for failures outside the envelope path.

pub mod active_loans;
pub mod capacity_decision_service;
pub mod credit;
pub mod credit_request_service;
pub mod credit_status_service;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod listing;
pub mod pipeline;
pub mod ports;
pub mod trace_id;

pub use self::active_loans::ActiveLoanAggregator;
pub use self::capacity_decision_service::CapacityDecisionService;
pub use self::credit::{
    ActiveLoan, ApprovedAmountEvent, CapacityDecision, CreditRequest, CreditRequestId,
    CreditState, CreditSummary, DebtCapacitySnapshot, DocumentNumber, LoanTypeId, OutboundEvent,
    RequesterId, StatusChangeEvent,
};
pub use self::credit_request_service::{CreditPorts, CreditRequestService};
pub use self::credit_status_service::CreditStatusService;
pub use self::dispatch::{
    ChannelKind, DEFAULT_PUBLISH_TIMEOUT, DispatchConfig, EventChannels, NotificationDispatcher,
    dispatch_best_effort,
};
pub use self::envelope::{
    Accepted, CreditListResult, FORBIDDEN_MESSAGE, FailureKind, OutcomeEnvelope,
    REQUESTER_NOT_FOUND_MESSAGE, Rejected, ResponseStatus, UNAUTHORIZED_MESSAGE,
    UNEXPECTED_ERROR_MESSAGE,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{Credential, IdentityContext};
pub use self::listing::CreditListingService;
pub use self::pipeline::{
    CREATE_STAGES, CreateStage, ErrorMessagePolicy, OnPriorFailure, PipelineError,
};
pub use self::trace_id::TraceId;
