//! Turns free text into an invocation request and renders the reply for a terminal.
//!
//! The dispatcher never relies on anything built here; any client may construct requests its
//! own way.

use querymcp_core::domain::invocation::InvocationRequest;
use serde_json::{json, Value};

use crate::handlers::SqlDialect;
use crate::registry::{MDM_AGENT, QUERY_AGENT, WORKFLOW_AGENT};

#[derive(Clone, Debug)]
pub struct RequestBuilder {
    dialect: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self { dialect: SqlDialect::Druid.as_str().to_string() }
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dialect sent with SQL requests. Passed through lowercased and unvalidated so the server
    /// decides whether it is supported.
    pub fn with_dialect(mut self, dialect: impl AsRef<str>) -> Self {
        self.dialect = dialect.as_ref().trim().to_ascii_lowercase();
        self
    }

    pub fn build(&self, text: &str) -> InvocationRequest {
        let normalized = text.to_ascii_lowercase();

        if normalized.contains("merge") {
            InvocationRequest::new(
                MDM_AGENT,
                "match_and_merge",
                json!({
                    "entity_type": "customer",
                    "survivorship": {"address": "most_recent"}
                }),
            )
        } else if normalized.contains("workflow") {
            InvocationRequest::new(
                WORKFLOW_AGENT,
                "create_workflow",
                json!({
                    "workflow_name": "Supplier Validation",
                    "steps": [
                        {"step": "validate_field", "field": "region"},
                        {"step": "route_to_team", "team": "ops"}
                    ]
                }),
            )
        } else {
            InvocationRequest::new(QUERY_AGENT, "generate_sql", json!({"dialect": self.dialect}))
        }
    }
}

/// SQL results become a fenced block; anything else is shown as the pretty-printed response.
pub fn render_response(response: &Value) -> String {
    if let Some(sql) = response.get("result").and_then(|result| result.get("sql")) {
        let sql = sql.as_str().map(str::to_string).unwrap_or_else(|| sql.to_string());
        return format!("```sql\n{sql}\n```");
    }

    serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string())
}
