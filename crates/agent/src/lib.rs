//! Agent dispatch for querymcp.
//!
//! - `handlers`: the pluggable capabilities (`query_agent`, `mdm_agent`, `workflow_agent`)
//! - `registry`: immutable name to handler mapping built once at startup
//! - `dispatcher`: validates a request, runs the handler, times it and appends an invocation
//!   record to the configured log
//! - `intake`: free-text request builder and response renderer used by the `ask` command

pub mod dispatcher;
pub mod handlers;
pub mod intake;
pub mod registry;

pub use dispatcher::{AuditPolicy, Dispatcher};
pub use handlers::{Handler, HandlerError};
pub use registry::{HandlerEntry, HandlerRegistry, RegistryError};
