use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value arguments or results exchanged with handlers.
pub type Payload = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(pub i64);

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Inbound request. The payload stays an untyped value so that non-mapping
/// payloads reach the dispatcher and are rejected there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub agent: String,
    pub intent: String,
    pub payload: Value,
}

impl InvocationRequest {
    pub fn new(agent: impl Into<String>, intent: impl Into<String>, payload: Value) -> Self {
        Self { agent: agent.into(), intent: intent.into(), payload }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status: ResponseStatus,
    pub result: Payload,
}

impl InvocationResponse {
    pub fn success(result: Payload) -> Self {
        Self { status: ResponseStatus::Success, result }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success,
    Failed,
}

impl InvocationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A record as produced by the dispatcher, before the log assigns its sequence id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewInvocationRecord {
    pub agent: String,
    pub intent: String,
    pub payload: String,
    /// Serialized result; empty when the handler failed.
    pub result: String,
    pub duration_secs: f64,
    pub outcome: InvocationOutcome,
    pub error: Option<String>,
}

impl NewInvocationRecord {
    pub fn succeeded(request: &InvocationRequest, result: &Payload, duration_secs: f64) -> Self {
        Self {
            agent: request.agent.clone(),
            intent: request.intent.clone(),
            payload: request.payload.to_string(),
            result: Value::Object(result.clone()).to_string(),
            duration_secs,
            outcome: InvocationOutcome::Success,
            error: None,
        }
    }

    pub fn failed(request: &InvocationRequest, reason: &str, duration_secs: f64) -> Self {
        Self {
            agent: request.agent.clone(),
            intent: request.intent.clone(),
            payload: request.payload.to_string(),
            result: String::new(),
            duration_secs,
            outcome: InvocationOutcome::Failed,
            error: Some(reason.to_string()),
        }
    }

    pub fn into_record(
        self,
        sequence_id: SequenceId,
        recorded_at: DateTime<Utc>,
    ) -> InvocationRecord {
        InvocationRecord {
            sequence_id,
            agent: self.agent,
            intent: self.intent,
            payload: self.payload,
            result: self.result,
            duration_secs: self.duration_secs,
            outcome: self.outcome,
            error: self.error,
            recorded_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub sequence_id: SequenceId,
    pub agent: String,
    pub intent: String,
    pub payload: String,
    pub result: String,
    pub duration_secs: f64,
    pub outcome: InvocationOutcome,
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{InvocationOutcome, InvocationRequest, InvocationResponse, NewInvocationRecord};

    #[test]
    fn response_serializes_with_success_status() {
        let mut result = serde_json::Map::new();
        result.insert("sql".to_string(), json!("SELECT 1;"));

        let encoded = serde_json::to_value(InvocationResponse::success(result)).expect("encode");

        assert_eq!(encoded, json!({"status": "success", "result": {"sql": "SELECT 1;"}}));
    }

    #[test]
    fn failed_record_keeps_payload_and_empty_result() {
        let request =
            InvocationRequest::new("query_agent", "generate_sql", json!({"dialect": "oracle"}));

        let record =
            NewInvocationRecord::failed(&request, "Unsupported SQL dialect: oracle", 0.002);

        assert_eq!(record.outcome, InvocationOutcome::Failed);
        assert!(record.result.is_empty());
        assert_eq!(record.payload, r#"{"dialect":"oracle"}"#);
        assert_eq!(record.error.as_deref(), Some("Unsupported SQL dialect: oracle"));
    }

    #[test]
    fn request_accepts_non_mapping_payload() {
        let request: InvocationRequest = serde_json::from_value(json!({
            "agent": "query_agent",
            "intent": "generate_sql",
            "payload": [1, 2, 3]
        }))
        .expect("decode");

        assert!(request.payload.is_array());
    }
}
