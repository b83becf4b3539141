//! Listener for debt-capacity decisions returned by the risk evaluator.
//!
//! Messages are JSON objects such as
//! `{"requestId": "12", "state": "approved"}`. The request id may be sent as
//! a string or a number and the state is matched case-insensitively. An
//! optional `traceId` is adopted as the correlation id for the decision.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::ports::CapacityDecisionCommand;
use crate::domain::{
    CapacityDecision, CreditRequest, CreditRequestId, CreditState, Error, ErrorCode, TraceId,
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequestIdDto {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecisionMessageDto {
    request_id: RequestIdDto,
    state: String,
    #[serde(default)]
    trace_id: Option<String>,
}

impl DecisionMessageDto {
    fn request_id(&self) -> Result<CreditRequestId, Error> {
        match &self.request_id {
            RequestIdDto::Number(id) => Ok(CreditRequestId::new(*id)),
            RequestIdDto::Text(text) => text
                .trim()
                .parse::<u64>()
                .map(CreditRequestId::new)
                .map_err(|_| {
                    Error::invalid_request("requestId must be a non-negative integer")
                        .with_details(json!({ "field": "requestId", "value": text }))
                }),
        }
    }

    fn state(&self) -> Result<CreditState, Error> {
        match self.state.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(CreditState::Approved),
            "rejected" => Ok(CreditState::Rejected),
            "pending_review" => Ok(CreditState::PendingReview),
            _ => Err(Error::invalid_request("state is not a known credit state")
                .with_details(json!({ "field": "state", "value": self.state }))),
        }
    }

    fn trace_id(&self) -> TraceId {
        self.trace_id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(TraceId::current_or_generate)
    }
}

/// Decodes decision messages and applies them.
#[derive(Clone)]
pub struct DecisionMessageHandler {
    decisions: Arc<dyn CapacityDecisionCommand>,
}

impl DecisionMessageHandler {
    /// Create a handler applying decisions through `decisions`.
    pub fn new(decisions: Arc<dyn CapacityDecisionCommand>) -> Self {
        Self { decisions }
    }

    /// Decode one message body and apply the decision it carries.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::domain::ErrorCode::InvalidRequest`] error for
    /// malformed bodies, otherwise whatever the decision command reports.
    pub async fn handle(&self, body: &str) -> Result<CreditRequest, Error> {
        let message: DecisionMessageDto = serde_json::from_str(body).map_err(|err| {
            Error::invalid_request(format!("malformed decision message: {err}"))
        })?;
        let decision = CapacityDecision {
            request_id: message.request_id()?,
            state: message.state()?,
        };
        let trace_id = message.trace_id();
        info!(
            trace_id = %trace_id,
            request_id = %decision.request_id,
            state = %decision.state,
            "capacity decision received"
        );
        TraceId::scope(trace_id, async move { self.decisions.apply(decision).await }).await
    }

    /// Drain `messages` until every sender is dropped.
    ///
    /// Failures are logged and the listener moves on to the next message.
    pub async fn listen(self, mut messages: mpsc::Receiver<String>) {
        while let Some(body) = messages.recv().await {
            match self.handle(&body).await {
                Ok(updated) => debug!(request_id = ?updated.id, "capacity decision applied"),
                Err(err) if err.code() == ErrorCode::InvalidRequest => {
                    warn!(error = %err, "discarding malformed decision message");
                }
                Err(err) => error!(error = %err, "capacity decision failed"),
            }
        }
        info!("decision listener stopped");
    }
}
