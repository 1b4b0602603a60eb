use crate::commands::{block_on, open_pool, CommandResult};
use querymcp_core::config::{AppConfig, LoadOptions};
use querymcp_db::{is_in_memory, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
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
        Err(message) => CommandResult::failure("migrate", "runtime_init", message, 3),
        Ok(Err((error_class, message, exit_code))) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
        Ok(Ok(())) => {
            let version = migrations::latest_version()
                .map(|version| version.to_string())
                .unwrap_or_else(|| "none".to_string());
            let mut message = format!("schema is at migration version {version}");
            if is_in_memory(&config.database.url) {
                message.push_str(" (in-memory database: the schema lasts only for this process)");
            }
            CommandResult::success("migrate", message)
        }
    }
}
