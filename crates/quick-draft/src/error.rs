//! Error Types
//!
//! Failure taxonomy shared by the bridge, templates and the composer.

use serde_json::Value;
use thiserror::Error;

use crate::settings::Messages;

/// Failure reported by the transport itself, passed through the bridge untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("request failed with status {status}")]
    Status { status: u16, response_text: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("request aborted")]
    Aborted,
}

/// Rejection of a bridge call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Well-formed `{success: false, data}` response; carries `data`.
    #[error("request rejected by server")]
    Rejected(Value),
    /// Response matched neither the sentinel nor the structured shape.
    #[error("unrecognized response shape")]
    Unrecognized(Value),
    #[error("request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    NotFound(String),
    #[error("unterminated `{delimiter}` at byte {offset}")]
    Unterminated { delimiter: &'static str, offset: usize },
    #[error("escape tag at byte {0} is followed by a stray `}}`")]
    AmbiguousClose(usize),
    #[error("`{0}` without a matching block")]
    UnbalancedBlock(String),
    #[error("unknown template statement `{0}`")]
    UnknownStatement(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("all fields are empty")]
    EmptyFields,
    #[error("status `{0}` is not allowed for a quick draft")]
    InvalidStatus(String),
}

/// How a submission attempt ended when it did not succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitFailure {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(TransportError),
    #[error("server rejected the draft: {0}")]
    ServerRejection(String),
    #[error("malformed response")]
    MalformedResponse,
}

impl SubmitFailure {
    /// Classify a bridge rejection, pulling a server message out when one is present.
    pub fn from_rpc(error: &RpcError) -> Self {
        match error {
            RpcError::Transport(status @ TransportError::Status { response_text, .. }) => {
                match message_from_text(response_text) {
                    Some(message) => SubmitFailure::ServerRejection(message),
                    None => SubmitFailure::Transport(status.clone()),
                }
            }
            RpcError::Transport(transport) => SubmitFailure::Transport(transport.clone()),
            RpcError::Cancelled => SubmitFailure::Transport(TransportError::Aborted),
            RpcError::Rejected(payload) => match message_from_payload(payload) {
                Some(message) => SubmitFailure::ServerRejection(message),
                None => SubmitFailure::MalformedResponse,
            },
            RpcError::Unrecognized(_) => SubmitFailure::MalformedResponse,
        }
    }

    /// The inline message for this failure.
    pub fn message(&self, messages: &Messages) -> String {
        match self {
            SubmitFailure::Validation(ValidationError::EmptyFields) => messages.error_empty_fields.clone(),
            SubmitFailure::Validation(ValidationError::InvalidStatus(_)) => messages.invalid_status.clone(),
            SubmitFailure::ServerRejection(message) => message.clone(),
            SubmitFailure::Transport(_) | SubmitFailure::MalformedResponse => messages.error.clone(),
        }
    }
}

#[derive(serde::Deserialize)]
struct ServerMessage {
    message: String,
}

fn message_from_text(text: &str) -> Option<String> {
    serde_json::from_str::<ServerMessage>(text)
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.is_empty())
}

fn message_from_payload(payload: &Value) -> Option<String> {
    match payload {
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string),
        Value::String(text) => message_from_text(text),
        _ => None,
    }
}
