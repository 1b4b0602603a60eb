use std::sync::Arc;

use querymcp_agent::{AuditPolicy, Dispatcher, HandlerRegistry, RegistryError};
use querymcp_core::config::{AppConfig, ConfigError, LoadOptions};
use querymcp_db::{connect_with_settings, migrations, DbPool, SqlInvocationLog};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("handler registry is invalid: {0}")]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        database_url = %config.database.url,
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let registry = HandlerRegistry::standard()?;
    let audit_policy = AuditPolicy::from_audit_failures(config.dispatch.audit_failures);
    info!(
        event_name = "system.bootstrap.registry_ready",
        correlation_id = "bootstrap",
        agents = ?registry.names(),
        audit_policy = ?audit_policy,
        "handler registry built"
    );

    let log = Arc::new(SqlInvocationLog::new(db_pool.clone()));
    let dispatcher =
        Arc::new(Dispatcher::new(Arc::new(registry), log).with_audit_policy(audit_policy));

    Ok(Application { config, db_pool, dispatcher })
}

#[cfg(test)]
mod tests {
    use querymcp_core::config::{ConfigOverrides, LoadOptions};
    use querymcp_core::domain::invocation::InvocationRequest;
    use serde_json::json;

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn in_memory() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_wires_log_table_and_dispatcher() {
        let app = bootstrap(in_memory()).await.expect("bootstrap succeeds");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'invocation_log'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query");
        assert_eq!(table_count, 1);

        app.dispatcher
            .handle(InvocationRequest::new("query_agent", "generate_sql", json!({})))
            .await
            .expect("dispatch succeeds");

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invocation_log")
            .fetch_one(&app.db_pool)
            .await
            .expect("count query");
        assert_eq!(rows, 1, "dispatcher should write through the bootstrapped pool");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_urls() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/querymcp".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }
}
