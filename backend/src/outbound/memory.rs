//! In-process adapters for local runs and integration tests.
//!
//! [`InMemoryCreditStore`] keeps records in a `BTreeMap` keyed by identifier
//! and assigns identifiers sequentially from 1. Listing rows are joined with
//! requester profiles and loan type names registered up front; unknown
//! entries fall back to empty names and a zero salary.
//!
//! Locks are held only for the duration of a map operation and never across
//! an `.await`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::ports::{
    CreditStore, CreditStoreError, LoanTypeLookup, LoanTypeLookupError, RequesterLookup,
    RequesterLookupError,
};
use crate::domain::{
    CreditRequest, CreditRequestId, CreditState, CreditSummary, DocumentNumber, LoanTypeId,
    RequesterId,
};

/// Applicant details joined into listing rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterProfile {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Declared base salary.
    pub base_salary: Decimal,
}

#[derive(Debug, Default)]
struct StoreState {
    last_id: u64,
    records: BTreeMap<CreditRequestId, CreditRequest>,
}

impl StoreState {
    fn next_id(&mut self) -> CreditRequestId {
        self.last_id += 1;
        CreditRequestId::new(self.last_id)
    }
}

/// Credit store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCreditStore {
    state: Mutex<StoreState>,
    profiles: BTreeMap<RequesterId, RequesterProfile>,
    loan_type_names: BTreeMap<LoanTypeId, String>,
}

impl InMemoryCreditStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the profile joined into listing rows for `requester_id`.
    #[must_use]
    pub fn with_requester(mut self, requester_id: RequesterId, profile: RequesterProfile) -> Self {
        self.profiles.insert(requester_id, profile);
        self
    }

    /// Register the display name of a loan type.
    #[must_use]
    pub fn with_loan_type_name(mut self, loan_type_id: LoanTypeId, name: impl Into<String>) -> Self {
        self.loan_type_names.insert(loan_type_id, name.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn summary_of(&self, record: &CreditRequest) -> CreditSummary {
        let profile = self.profiles.get(&record.requester_id);
        CreditSummary {
            applicant_name: profile.map(|p| p.name.clone()).unwrap_or_default(),
            email: profile
                .map(|p| p.email.clone())
                .or_else(|| record.notification_email.clone())
                .unwrap_or_default(),
            amount: record.amount,
            term_months: record.term_months,
            loan_type_name: self
                .loan_type_names
                .get(&record.loan_type_id)
                .cloned()
                .unwrap_or_default(),
            monthly_rate: record.monthly_rate,
            base_salary: profile.map_or(Decimal::ZERO, |p| p.base_salary),
            state: record.state,
        }
    }
}

fn check_constraints(request: &CreditRequest) -> Result<(), CreditStoreError> {
    let violations = request.violations();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CreditStoreError::constraint_violation(violations))
    }
}

#[async_trait]
impl CreditStore for InMemoryCreditStore {
    async fn create(&self, request: &CreditRequest) -> Result<CreditRequest, CreditStoreError> {
        check_constraints(request)?;
        let mut state = self.lock();
        let mut stored = request.clone();
        let id = state.next_id();
        stored.id = Some(id);
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        id: CreditRequestId,
    ) -> Result<Option<CreditRequest>, CreditStoreError> {
        Ok(self.lock().records.get(&id).cloned())
    }

    async fn save(&self, request: &CreditRequest) -> Result<CreditRequest, CreditStoreError> {
        check_constraints(request)?;
        let mut state = self.lock();
        let mut stored = request.clone();
        let id = match stored.id {
            Some(id) => id,
            None => state.next_id(),
        };
        stored.id = Some(id);
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_by_requester(
        &self,
        requester_id: RequesterId,
    ) -> Result<Vec<CreditRequest>, CreditStoreError> {
        Ok(self
            .lock()
            .records
            .values()
            .filter(|record| record.requester_id == requester_id)
            .cloned()
            .collect())
    }

    async fn update_state(
        &self,
        id: CreditRequestId,
        new_state: CreditState,
    ) -> Result<Option<CreditRequest>, CreditStoreError> {
        let mut state = self.lock();
        Ok(state.records.get_mut(&id).map(|record| {
            record.state = Some(new_state);
            record.clone()
        }))
    }

    async fn count_all(&self) -> Result<u64, CreditStoreError> {
        let count = self.lock().records.len();
        u64::try_from(count).map_err(|err| CreditStoreError::query(err.to_string()))
    }

    async fn find_page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<CreditSummary>, CreditStoreError> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let state = self.lock();
        Ok(state
            .records
            .values()
            .skip(skip)
            .take(take)
            .map(|record| self.summary_of(record))
            .collect())
    }
}

/// Loan type catalogue with a fixed set of products.
#[derive(Debug, Clone, Default)]
pub struct StaticLoanTypeLookup {
    known: BTreeSet<LoanTypeId>,
}

impl StaticLoanTypeLookup {
    /// Create a catalogue holding `known`.
    pub fn new(known: impl IntoIterator<Item = LoanTypeId>) -> Self {
        Self {
            known: known.into_iter().collect(),
        }
    }
}

#[async_trait]
impl LoanTypeLookup for StaticLoanTypeLookup {
    async fn resolve_by_id(&self, id: LoanTypeId) -> Result<LoanTypeId, LoanTypeLookupError> {
        if self.known.contains(&id) {
            Ok(id)
        } else {
            Err(LoanTypeLookupError::not_found(id))
        }
    }
}

/// Requester directory backed by a fixed document-to-requester map.
#[derive(Debug, Clone, Default)]
pub struct StaticRequesterLookup {
    requesters: BTreeMap<DocumentNumber, RequesterId>,
}

impl StaticRequesterLookup {
    /// Create a directory from `(document, requester)` pairs.
    pub fn new(requesters: impl IntoIterator<Item = (DocumentNumber, RequesterId)>) -> Self {
        Self {
            requesters: requesters.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RequesterLookup for StaticRequesterLookup {
    async fn find_by_document(
        &self,
        document: DocumentNumber,
    ) -> Result<Option<RequesterId>, RequesterLookupError> {
        Ok(self
            .requesters
            .get(&document)
            .copied()
            .filter(|id| id.get() != 0))
    }
}
