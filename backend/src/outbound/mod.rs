//! Outbound adapters implementing the domain's driven ports.
//!
//! - `jwt`: HS256 bearer-token credential validation.
//! - `user_directory`: HTTP requester lookup against the user directory.
//! - `queue`: in-process event channels.
//! - `json`: JSON event serialisation.
//! - `memory`: in-process store, catalogue and directory for local runs.

pub mod json;
pub mod jwt;
pub mod memory;
pub mod queue;
pub mod user_directory;
