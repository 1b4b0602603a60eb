pub mod config;
pub mod domain;
pub mod errors;
pub mod invocation_log;

pub use domain::invocation::{
    InvocationOutcome, InvocationRecord, InvocationRequest, InvocationResponse,
    NewInvocationRecord, Payload, ResponseStatus, SequenceId,
};
pub use errors::{DispatchError, InterfaceError, StorageError};
pub use invocation_log::{InMemoryInvocationLog, InvocationLog};
