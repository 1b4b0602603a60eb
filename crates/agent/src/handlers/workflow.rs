use async_trait::async_trait;
use querymcp_core::domain::invocation::Payload;
use serde_json::Value;

use super::{json_type_name, optional_str, Handler, HandlerError};

/// `workflow_agent`: echoes back the workflow definition it was asked to create.
#[derive(Clone, Debug, Default)]
pub struct WorkflowHandler;

#[async_trait]
impl Handler for WorkflowHandler {
    fn description(&self) -> &'static str {
        "create a named workflow from an ordered list of steps"
    }

    async fn invoke(&self, payload: &Payload) -> Result<Payload, HandlerError> {
        let name = optional_str(payload, "workflow_name")?.unwrap_or("Unnamed");
        let steps = match payload.get("steps") {
            None | Some(Value::Null) => Value::Array(Vec::new()),
            Some(steps @ Value::Array(_)) => steps.clone(),
            Some(other) => {
                return Err(HandlerError::InvalidField {
                    field: "steps",
                    reason: format!("expected an array, got {}", json_type_name(other)),
                })
            }
        };

        let mut result = Payload::new();
        result.insert("workflow_name".to_string(), Value::String(name.to_string()));
        result.insert("steps".to_string(), steps);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::WorkflowHandler;
    use crate::handlers::{Handler, HandlerError};

    #[tokio::test]
    async fn returns_name_and_steps_in_order() {
        let payload = json!({
            "workflow_name": "Supplier Validation",
            "steps": [
                {"step": "validate_field", "field": "region"},
                {"step": "route_to_team", "team": "ops"}
            ]
        });

        let result = WorkflowHandler
            .invoke(payload.as_object().expect("object"))
            .await
            .expect("workflow succeeds");

        assert_eq!(Value::Object(result), payload);
    }

    #[tokio::test]
    async fn missing_fields_fall_back_to_unnamed_empty_workflow() {
        let result =
            WorkflowHandler.invoke(&serde_json::Map::new()).await.expect("workflow succeeds");

        assert_eq!(Value::Object(result), json!({"workflow_name": "Unnamed", "steps": []}));
    }

    #[tokio::test]
    async fn explicit_nulls_read_as_missing_fields() {
        let payload = json!({"workflow_name": null, "steps": null});

        let result = WorkflowHandler
            .invoke(payload.as_object().expect("object"))
            .await
            .expect("workflow succeeds");

        assert_eq!(Value::Object(result), json!({"workflow_name": "Unnamed", "steps": []}));
    }

    #[tokio::test]
    async fn steps_must_be_a_list() {
        let payload = json!({"steps": {"step": "validate_field"}});

        let error = WorkflowHandler
            .invoke(payload.as_object().expect("object"))
            .await
            .expect_err("object steps");

        assert!(matches!(error, HandlerError::InvalidField { field: "steps", .. }));
    }
}
