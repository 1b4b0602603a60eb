//! HTTP binding for the dispatcher.
//!
//! `POST /mcp` takes an invocation request and answers with the handler result or a classified
//! error body. `GET /invocations` reads back the newest invocation records.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use querymcp_agent::Dispatcher;
use querymcp_core::domain::invocation::{InvocationRecord, InvocationRequest, InvocationResponse};
use querymcp_core::errors::InterfaceError;
use querymcp_core::invocation_log::InvocationLog;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_RECENT_LIMIT: usize = 50;
pub const MAX_RECENT_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
    correlation_id: String,
}

/// Transport wrapper that turns an `InterfaceError` into a status code and JSON body.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.0.kind(),
                message: self.0.message().to_string(),
                correlation_id: self.0.correlation_id().to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecentInvocations {
    pub records: Vec<InvocationRecord>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(invoke))
        .route("/invocations", get(recent_invocations))
        .with_state(state)
}

async fn invoke(
    State(state): State<AppState>,
    request: Result<Json<InvocationRequest>, JsonRejection>,
) -> Result<Json<InvocationResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let Json(request) = request.map_err(|rejection| {
        info!(
            event_name = "system.http.request_rejected",
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "request body is not a valid invocation request"
        );
        InterfaceError::bad_request(rejection.body_text(), &correlation_id)
    })?;

    state
        .dispatcher
        .handle_with_correlation(request, &correlation_id)
        .await
        .map(Json)
        .map_err(|dispatch_error| ApiError(dispatch_error.into_interface(&correlation_id)))
}

async fn recent_invocations(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentInvocations>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT);

    match state.dispatcher.log().recent(limit).await {
        Ok(records) => Ok(Json(RecentInvocations { records })),
        Err(storage_error) => {
            let correlation_id = Uuid::new_v4().to_string();
            error!(
                event_name = "system.http.log_read_failed",
                correlation_id = %correlation_id,
                error = %storage_error,
                "invocation log read failed"
            );
            Err(ApiError(InterfaceError::Internal {
                kind: "log_unavailable",
                message: "invocation log is unavailable".to_string(),
                correlation_id,
            }))
        }
    }
}
