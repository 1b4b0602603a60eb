use thiserror::Error;

/// Caller-visible dispatch failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown agent `{agent}`")]
    UnknownAgent { agent: String },
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },
    #[error("{reason}")]
    HandlerFailure { agent: String, reason: String },
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAgent { .. } => "unknown_agent",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::HandlerFailure { .. } => "handler_failure",
        }
    }
}

/// Invocation log failures. These never reach a caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("log database error: {0}")]
    Database(String),
    #[error("log record could not be encoded or decoded: {0}")]
    Serialization(String),
    #[error("log store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { kind: &'static str, message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { kind: &'static str, message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { kind: &'static str, message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::BadRequest {
            kind: "bad_request",
            message: message.into(),
            correlation_id: correlation_id.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { kind, .. }
            | Self::NotFound { kind, .. }
            | Self::Internal { kind, .. } => *kind,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl DispatchError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<DispatchError> for InterfaceError {
    fn from(value: DispatchError) -> Self {
        let kind = value.kind();
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            DispatchError::UnknownAgent { .. } => Self::NotFound { kind, message, correlation_id },
            DispatchError::InvalidPayload { .. } => {
                Self::BadRequest { kind, message, correlation_id }
            }
            DispatchError::HandlerFailure { .. } => {
                Self::Internal { kind, message, correlation_id }
            }
        }
    }
}
