//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (credential validation, catalogue and directory lookups,
//! storage, event channels) are implemented in `crate::outbound`. Driving
//! ports are implemented by the domain services and consumed by
//! `crate::inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod capacity_decision_command;
mod credential_validator;
mod credit_listing_query;
mod credit_request_command;
mod credit_status_command;
mod credit_store;
mod event_channel;
mod event_serializer;
mod loan_type_lookup;
mod requester_lookup;

#[cfg(test)]
pub use capacity_decision_command::MockCapacityDecisionCommand;
pub use capacity_decision_command::CapacityDecisionCommand;
#[cfg(test)]
pub use credential_validator::MockCredentialValidator;
pub use credential_validator::{CredentialError, CredentialValidator};
#[cfg(test)]
pub use credit_listing_query::MockCreditListingQuery;
pub use credit_listing_query::CreditListingQuery;
#[cfg(test)]
pub use credit_request_command::MockCreditRequestCommand;
pub use credit_request_command::CreditRequestCommand;
#[cfg(test)]
pub use credit_status_command::MockCreditStatusCommand;
pub use credit_status_command::CreditStatusCommand;
#[cfg(test)]
pub use credit_store::MockCreditStore;
pub use credit_store::{CreditStore, CreditStoreError};
#[cfg(test)]
pub use event_channel::MockEventChannel;
pub use event_channel::{EventChannel, EventChannelError};
#[cfg(test)]
pub use event_serializer::MockEventSerializer;
pub use event_serializer::{EventSerializer, SerializationError};
#[cfg(test)]
pub use loan_type_lookup::MockLoanTypeLookup;
pub use loan_type_lookup::{LoanTypeLookup, LoanTypeLookupError};
#[cfg(test)]
pub use requester_lookup::MockRequesterLookup;
pub use requester_lookup::{RequesterLookup, RequesterLookupError};
