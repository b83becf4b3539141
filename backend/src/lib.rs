//! Credit request orchestration core.
//!
//! The [`domain`] module holds the records, pipelines and ports. Adapters for
//! credential validation, the user directory, event channels and in-process
//! storage live in [`outbound`]; the capacity decision listener lives in
//! [`inbound`].

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;
pub mod telemetry;

pub use domain::TraceId;

#[cfg(test)]
mod test_support;
