use async_trait::async_trait;
use querymcp_core::domain::invocation::Payload;
use serde_json::Value;

use super::{json_type_name, optional_str, Handler, HandlerError};

/// `mdm_agent`: acknowledges a match-and-merge run for an entity type.
#[derive(Clone, Debug, Default)]
pub struct MatchMergeHandler;

#[async_trait]
impl Handler for MatchMergeHandler {
    fn description(&self) -> &'static str {
        "merge duplicate master-data entities using survivorship rules"
    }

    async fn invoke(&self, payload: &Payload) -> Result<Payload, HandlerError> {
        let entity = optional_str(payload, "entity_type")?.unwrap_or("unknown");
        let rules = match payload.get("survivorship") {
            None | Some(Value::Null) => Value::Object(Payload::new()),
            Some(rules @ Value::Object(_)) => rules.clone(),
            Some(other) => {
                return Err(HandlerError::InvalidField {
                    field: "survivorship",
                    reason: format!("expected an object, got {}", json_type_name(other)),
                })
            }
        };

        let mut result = Payload::new();
        result.insert(
            "message".to_string(),
            Value::String(format!("Merged duplicates for entity {entity} using rules: {rules}")),
        );
        Ok(result)
    }
}
