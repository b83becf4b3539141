//! Tests for the credit request creation pipeline.

use std::collections::BTreeSet;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::envelope::{UNAUTHORIZED_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
use crate::domain::ports::{
    CredentialError, CreditStoreError, LoanTypeLookupError, MockCredentialValidator,
    MockCreditStore, MockLoanTypeLookup, MockRequesterLookup,
};
use crate::domain::{
    CreditRequestId, DocumentNumber, LoanTypeId, RequesterId, ResponseStatus,
};
use crate::test_support::credit::{RecordingChannels, fixture_clock, fixture_timestamp};

const EMAIL: &str = "ana@example.com";

struct Doubles {
    credentials: MockCredentialValidator,
    loan_types: MockLoanTypeLookup,
    requesters: MockRequesterLookup,
    store: MockCreditStore,
    channels: RecordingChannels,
}

impl Doubles {
    fn service(self) -> (CreditRequestService, RecordingChannels) {
        let ports = CreditPorts::new(
            Arc::new(self.credentials),
            Arc::new(self.loan_types),
            Arc::new(self.requesters),
            Arc::new(self.store),
            self.channels.dispatcher(),
        );
        (CreditRequestService::new(ports, fixture_clock()), self.channels)
    }

    fn expect_caller(&mut self, subject: &'static str) {
        self.credentials
            .expect_subject()
            .returning(move |_| Ok(subject.to_owned()));
        self.credentials
            .expect_email()
            .returning(|_| Ok(EMAIL.to_owned()));
        self.credentials
            .expect_declared_income()
            .returning(|_| Ok(Decimal::new(4000, 0)));
        self.credentials
            .expect_roles()
            .returning(|_| Ok(BTreeSet::new()));
    }

    fn expect_loan_type_found(&mut self) {
        self.loan_types
            .expect_resolve_by_id()
            .times(1)
            .returning(Ok);
    }

    fn expect_requester(&mut self, found: Option<u64>) {
        self.requesters
            .expect_find_by_document()
            .times(1)
            .returning(move |_| Ok(found.map(RequesterId::new)));
    }

    fn expect_store_assigns_id(&mut self, id: u64) {
        self.store
            .expect_create()
            .times(1)
            .returning(move |request| {
                let mut stored = request.clone();
                stored.id = Some(CreditRequestId::new(id));
                Ok(stored)
            });
    }

    fn expect_store_without_email_column(&mut self, id: u64) {
        self.store
            .expect_create()
            .times(1)
            .returning(move |request| {
                let mut stored = request.clone();
                stored.id = Some(CreditRequestId::new(id));
                stored.notification_email = None;
                Ok(stored)
            });
    }

    fn expect_no_downstream_calls(&mut self) {
        self.loan_types.expect_resolve_by_id().times(0);
        self.requesters.expect_find_by_document().times(0);
        self.store.expect_create().times(0);
        self.store.expect_list_by_requester().times(0);
    }
}

#[fixture]
fn doubles() -> Doubles {
    Doubles {
        credentials: MockCredentialValidator::new(),
        loan_types: MockLoanTypeLookup::new(),
        requesters: MockRequesterLookup::new(),
        store: MockCreditStore::new(),
        channels: RecordingChannels::default(),
    }
}

fn sample_request() -> CreditRequest {
    CreditRequest::new(
        RequesterId::new(7),
        DocumentNumber::new(1_020_304),
        LoanTypeId::new(2),
        Decimal::new(5000, 0),
        12,
        Decimal::new(15, 1),
    )
}

fn credential() -> Credential {
    Credential::from("Bearer token")
}

#[rstest]
#[tokio::test]
async fn create_persists_a_valid_request(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles.expect_store_assigns_id(11);
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(outcome.status(), ResponseStatus::Ok);
    let payload = outcome.payload().expect("payload present");
    assert_eq!(payload.id, Some(CreditRequestId::new(11)));
    assert_eq!(payload.state, Some(CreditState::PendingReview));
    assert_eq!(payload.notification_email.as_deref(), Some(EMAIL));
    assert_eq!(payload.created_at, Some(fixture_timestamp()));
}

#[rstest]
#[tokio::test]
async fn stamped_email_survives_a_store_that_drops_it(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles.expect_store_without_email_column(11);
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    let payload = outcome.payload().expect("payload present");
    assert_eq!(payload.id, Some(CreditRequestId::new(11)));
    assert_eq!(payload.notification_email.as_deref(), Some(EMAIL));
}

#[rstest]
#[tokio::test]
async fn capacity_snapshot_keeps_email_the_store_dropped(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles.expect_store_without_email_column(11);
    doubles
        .store
        .expect_list_by_requester()
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let (service, channels) = doubles.service();

    service
        .create_with_capacity_check(sample_request(), &credential())
        .await;
    service.dispatcher.flush().await;

    let published = channels.capacity.published_json();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["requesterEmail"], json!(EMAIL));
}

#[rstest]
#[tokio::test]
async fn requester_lookup_overwrites_requester_id(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(99));
    doubles.expect_store_assigns_id(1);
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(
        outcome.payload().map(|request| request.requester_id),
        Some(RequesterId::new(99))
    );
}

#[rstest]
#[tokio::test]
async fn ownership_mismatch_skips_every_remote_call(mut doubles: Doubles) {
    doubles.expect_caller("8");
    doubles.expect_no_downstream_calls();
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(outcome.status(), ResponseStatus::Error);
    assert_eq!(outcome.error_message(), Some(UNAUTHORIZED_MESSAGE));
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Unauthorized));
    let payload = outcome.payload().expect("rejected request kept");
    assert_eq!(payload.notification_email.as_deref(), Some(EMAIL));
    assert!(payload.id.is_none());
}

#[rstest]
#[tokio::test]
async fn loan_type_lookup_failure_is_normalised(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles
        .loan_types
        .expect_resolve_by_id()
        .times(1)
        .returning(|id| Err(LoanTypeLookupError::not_found(id)));
    doubles.requesters.expect_find_by_document().times(0);
    doubles.store.expect_create().times(0);
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(outcome.status(), ResponseStatus::Error);
    assert_eq!(outcome.error_message(), Some(UNEXPECTED_ERROR_MESSAGE));
    assert!(outcome.payload().is_none());
}

#[rstest]
#[case::absent(None)]
#[case::zero(Some(0))]
#[tokio::test]
async fn missing_requester_rejects_without_persisting(
    mut doubles: Doubles,
    #[case] found: Option<u64>,
) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(found);
    doubles.store.expect_create().times(0);
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(outcome.error_message(), Some(REQUESTER_NOT_FOUND_MESSAGE));
    assert_eq!(outcome.failure_kind(), Some(FailureKind::RequesterNotFound));
    assert_eq!(
        outcome.payload().and_then(|request| request.notification_email.as_deref()),
        Some(EMAIL)
    );
}

#[rstest]
#[tokio::test]
async fn constraint_violations_are_comma_joined(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles.store.expect_create().times(0);
    let (service, _channels) = doubles.service();
    let mut request = sample_request();
    request.amount = Decimal::ZERO;
    request.term_months = 0;

    let outcome = service.create(request, &credential()).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Validation));
    assert_eq!(
        outcome.error_message(),
        Some("amount must be greater than zero, term must be at least one month")
    );
}

#[rstest]
#[tokio::test]
async fn store_failure_becomes_unexpected_error(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles
        .store
        .expect_create()
        .times(1)
        .returning(|_| Err(CreditStoreError::connection("pool exhausted")));
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(outcome.error_message(), Some(UNEXPECTED_ERROR_MESSAGE));
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Unexpected));
}

#[rstest]
#[tokio::test]
async fn unreadable_credential_becomes_unexpected_error(mut doubles: Doubles) {
    doubles
        .credentials
        .expect_email()
        .returning(|_| Err(CredentialError::invalid_credential("signature mismatch")));
    doubles.credentials.expect_subject().times(0);
    doubles.expect_no_downstream_calls();
    let (service, _channels) = doubles.service();

    let outcome = service.create(sample_request(), &credential()).await;

    assert_eq!(outcome.status(), ResponseStatus::Error);
    assert_eq!(outcome.error_message(), Some(UNEXPECTED_ERROR_MESSAGE));
}

#[rstest]
#[tokio::test]
async fn capacity_variant_emits_snapshot_in_background(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles.expect_store_assigns_id(11);
    doubles
        .store
        .expect_list_by_requester()
        .times(1)
        .returning(|requester_id| {
            Ok(vec![
                CreditRequest {
                    id: Some(CreditRequestId::new(3)),
                    requester_id,
                    amount: Decimal::new(1200, 0),
                    term_months: 6,
                    monthly_rate: Decimal::new(2, 0),
                    state: Some(CreditState::Approved),
                    ..CreditRequest::default()
                },
                CreditRequest {
                    id: Some(CreditRequestId::new(4)),
                    requester_id,
                    state: Some(CreditState::Rejected),
                    ..CreditRequest::default()
                },
            ])
        });
    let (service, channels) = doubles.service();

    let outcome = service
        .create_with_capacity_check(sample_request(), &credential())
        .await;
    service.dispatcher.flush().await;

    assert_eq!(outcome.status(), ResponseStatus::Ok);
    let published = channels.capacity.published_json();
    assert_eq!(published.len(), 1);
    let snapshot = &published[0];
    assert_eq!(snapshot["requestId"], json!(11));
    assert_eq!(snapshot["declaredIncome"], json!("4000"));
    assert_eq!(snapshot["requesterEmail"], json!(EMAIL));
    assert_eq!(
        snapshot["activeLoans"],
        json!([{ "id": 3, "principal": "1200", "termMonths": 6, "monthlyRate": "2" }])
    );
    assert!(channels.notification.published().is_empty());
}

#[rstest]
#[tokio::test]
async fn capacity_aggregation_failure_leaves_result_untouched(mut doubles: Doubles) {
    doubles.expect_caller("7");
    doubles.expect_loan_type_found();
    doubles.expect_requester(Some(7));
    doubles.expect_store_assigns_id(11);
    doubles
        .store
        .expect_list_by_requester()
        .times(1)
        .returning(|_| Err(CreditStoreError::query("timeout")));
    let (service, channels) = doubles.service();

    let outcome = service
        .create_with_capacity_check(sample_request(), &credential())
        .await;
    service.dispatcher.flush().await;

    assert_eq!(outcome.status(), ResponseStatus::Ok);
    assert!(channels.capacity.published().is_empty());
}

#[rstest]
#[tokio::test]
async fn capacity_variant_skips_evaluation_after_rejection(mut doubles: Doubles) {
    doubles.expect_caller("8");
    doubles.expect_no_downstream_calls();
    let (service, channels) = doubles.service();

    let outcome = service
        .create_with_capacity_check(sample_request(), &credential())
        .await;
    service.dispatcher.flush().await;

    assert!(outcome.is_error());
    assert!(channels.capacity.published().is_empty());
}

#[rstest]
#[tokio::test]
async fn capacity_variant_requires_declared_income(mut doubles: Doubles) {
    doubles
        .credentials
        .expect_email()
        .returning(|_| Ok(EMAIL.to_owned()));
    doubles
        .credentials
        .expect_declared_income()
        .returning(|_| Err(CredentialError::missing_claim("salarioBase")));
    doubles.expect_no_downstream_calls();
    let (service, _channels) = doubles.service();

    let outcome = service
        .create_with_capacity_check(sample_request(), &credential())
        .await;

    assert_eq!(outcome.error_message(), Some(UNEXPECTED_ERROR_MESSAGE));
}
