//! Inbound adapters that translate external messages into domain service
//! calls while keeping transport details at the edge.
//!
//! Queue consumers live under [`queue`].

pub mod queue;
