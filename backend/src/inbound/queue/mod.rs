//! Queue-driven inbound adapters.

mod decision_listener;

pub use decision_listener::DecisionMessageHandler;
