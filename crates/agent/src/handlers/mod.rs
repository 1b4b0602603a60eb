//! Pluggable agent handlers.
//!
//! A handler turns a payload mapping into a result mapping or fails with a reason. Handlers are
//! stateless; the dispatcher validates that the payload is a mapping but never inspects its
//! fields, so each handler checks the fields it reads.

use async_trait::async_trait;
use querymcp_core::domain::invocation::Payload;
use serde_json::Value;
use thiserror::Error;

pub mod mdm;
pub mod query;
pub mod workflow;

pub use mdm::MatchMergeHandler;
pub use query::{QueryBuilderHandler, SqlDialect};
pub use workflow::WorkflowHandler;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Unsupported SQL dialect: {0}")]
    UnsupportedDialect(String),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[async_trait]
pub trait Handler: Send + Sync {
    /// Short human-readable summary, used by operator tooling.
    fn description(&self) -> &'static str;

    async fn invoke(&self, payload: &Payload) -> Result<Payload, HandlerError>;
}

pub(crate) fn optional_str<'a>(
    payload: &'a Payload,
    field: &'static str,
) -> Result<Option<&'a str>, HandlerError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(HandlerError::InvalidField {
            field,
            reason: format!("expected a string, got {}", json_type_name(other)),
        }),
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
