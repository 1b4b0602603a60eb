//! `start`: the checks the server runs before it binds, without binding.

use crate::commands::{block_on, open_pool, CommandResult};
use querymcp_agent::HandlerRegistry;
use querymcp_core::config::{AppConfig, LoadOptions};
use querymcp_db::migrations;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "start",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let registry = match HandlerRegistry::standard() {
        Ok(registry) => registry,
        Err(error) => {
            return CommandResult::failure("start", "handler_registry", error.to_string(), 7);
        }
    };

    let outcome = block_on(async {
        let pool =
            open_pool(&config.database).await.map_err(|error| ("db_connectivity", error, 4u8))?;
        let applied = migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8));
        pool.close().await;
        applied
    });

    match outcome {
        Err(message) => CommandResult::failure("start", "runtime_init", message, 3),
        Ok(Err((error_class, message, exit_code))) => {
            CommandResult::failure("start", error_class, message, exit_code)
        }
        Ok(Ok(())) => CommandResult::success(
            "start",
            format!(
                "preflight passed: would serve agents [{}] on {} (audit_failures={})",
                registry.names().join(", "),
                config.server.socket_address(),
                config.dispatch.audit_failures
            ),
        ),
    }
}
