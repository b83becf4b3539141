//! Test utilities for the backend crate.
//!
//! Shared doubles for the domain unit tests. Only compiled when running
//! tests.

pub mod credit;
