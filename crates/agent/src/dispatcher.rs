use std::sync::Arc;
use std::time::Instant;

use querymcp_core::domain::invocation::{
    InvocationRequest, InvocationResponse, NewInvocationRecord,
};
use querymcp_core::errors::DispatchError;
use querymcp_core::invocation_log::InvocationLog;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::handlers::json_type_name;
use crate::registry::HandlerRegistry;

/// Which handler outcomes get an invocation record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuditPolicy {
    /// Successful and failed handler calls are both recorded.
    #[default]
    AllCalls,
    /// Only successful handler calls are recorded.
    SuccessOnly,
}

impl AuditPolicy {
    pub fn from_audit_failures(audit_failures: bool) -> Self {
        if audit_failures {
            Self::AllCalls
        } else {
            Self::SuccessOnly
        }
    }
}

pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    log: Arc<dyn InvocationLog>,
    audit_policy: AuditPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, log: Arc<dyn InvocationLog>) -> Self {
        Self { registry, log, audit_policy: AuditPolicy::default() }
    }

    pub fn with_audit_policy(mut self, audit_policy: AuditPolicy) -> Self {
        self.audit_policy = audit_policy;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn log(&self) -> &Arc<dyn InvocationLog> {
        &self.log
    }

    pub async fn handle(
        &self,
        request: InvocationRequest,
    ) -> Result<InvocationResponse, DispatchError> {
        let correlation_id = Uuid::new_v4().to_string();
        self.handle_with_correlation(request, &correlation_id).await
    }

    pub async fn handle_with_correlation(
        &self,
        request: InvocationRequest,
        correlation_id: &str,
    ) -> Result<InvocationResponse, DispatchError> {
        let started = Instant::now();

        let Some(handler) = self.registry.lookup(&request.agent) else {
            info!(
                event_name = "dispatch.invocation.rejected",
                correlation_id,
                agent = %request.agent,
                intent = %request.intent,
                reason = "unknown_agent",
                "request names an agent that is not registered"
            );
            return Err(DispatchError::UnknownAgent { agent: request.agent });
        };

        let Some(payload) = request.payload.as_object() else {
            let reason = format!(
                "payload must be a JSON object, got {}",
                json_type_name(&request.payload)
            );
            info!(
                event_name = "dispatch.invocation.rejected",
                correlation_id,
                agent = %request.agent,
                intent = %request.intent,
                reason = "invalid_payload",
                "request payload is not a mapping"
            );
            return Err(DispatchError::InvalidPayload { reason });
        };

        let outcome = handler.invoke(payload).await;
        let duration_secs = elapsed_secs(started, Instant::now(), correlation_id);

        match outcome {
            Ok(result) => {
                info!(
                    event_name = "dispatch.invocation.completed",
                    correlation_id,
                    agent = %request.agent,
                    intent = %request.intent,
                    duration_secs,
                    "handler completed"
                );
                self.record(
                    NewInvocationRecord::succeeded(&request, &result, duration_secs),
                    correlation_id,
                )
                .await;
                Ok(InvocationResponse::success(result))
            }
            Err(failure) => {
                let reason = failure.to_string();
                warn!(
                    event_name = "dispatch.invocation.failed",
                    correlation_id,
                    agent = %request.agent,
                    intent = %request.intent,
                    duration_secs,
                    error = %reason,
                    "handler failed"
                );
                if self.audit_policy == AuditPolicy::AllCalls {
                    self.record(
                        NewInvocationRecord::failed(&request, &reason, duration_secs),
                        correlation_id,
                    )
                    .await;
                }
                Err(DispatchError::HandlerFailure { agent: request.agent, reason })
            }
        }
    }

    /// Best effort: a log failure is reported and otherwise ignored.
    async fn record(&self, record: NewInvocationRecord, correlation_id: &str) {
        let agent = record.agent.clone();
        match self.log.append(record).await {
            Ok(stored) => debug!(
                event_name = "dispatch.log.appended",
                correlation_id,
                agent = %agent,
                sequence_id = stored.sequence_id.0,
                "invocation recorded"
            ),
            Err(storage_error) => error!(
                event_name = "dispatch.log.append_failed",
                correlation_id,
                agent = %agent,
                error = %storage_error,
                "invocation could not be recorded"
            ),
        }
    }
}

fn elapsed_secs(started: Instant, finished: Instant, correlation_id: &str) -> f64 {
    match finished.checked_duration_since(started) {
        Some(elapsed) => round_to_millis(elapsed.as_secs_f64()),
        None => {
            warn!(
                event_name = "dispatch.clock.anomaly",
                correlation_id,
                "monotonic clock went backwards; recording zero duration"
            );
            0.0
        }
    }
}

fn round_to_millis(secs: f64) -> f64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0.0;
    }
    (secs * 1000.0).round() / 1000.0
}
