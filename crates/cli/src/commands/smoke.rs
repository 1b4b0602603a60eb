use std::sync::Arc;
use std::time::Instant;

use crate::commands::{block_on, open_pool, CommandResult};
use querymcp_agent::{AuditPolicy, Dispatcher, HandlerRegistry};
use querymcp_core::config::{AppConfig, LoadOptions};
use querymcp_core::domain::invocation::InvocationRequest;
use querymcp_core::invocation_log::InvocationLog;
use querymcp_db::{migrations, SqlInvocationLog};
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

const DATABASE_CHECKS: [&str; 3] =
    ["db_connectivity", "migration_visibility", "dispatch_round_trip"];

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config_started = Instant::now();
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(passed(
                "config_validation",
                config_started,
                "configuration loaded and validated".to_string(),
            ));
            config
        }
        Err(error) => {
            checks.push(failed("config_validation", config_started, error.to_string()));
            checks.extend(DATABASE_CHECKS.into_iter().map(skipped));
            return finalize_report(checks, elapsed_ms(started));
        }
    };

    match block_on(database_checks(&config)) {
        Ok(database) => checks.extend(database),
        Err(message) => {
            checks.push(SmokeCheck {
                name: DATABASE_CHECKS[0],
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message,
            });
            checks.extend(DATABASE_CHECKS[1..].iter().copied().map(skipped));
        }
    }

    finalize_report(checks, elapsed_ms(started))
}

/// Connect, migrate, then push one request through a dispatcher backed by the configured log.
async fn database_checks(config: &AppConfig) -> Vec<SmokeCheck> {
    let mut checks = Vec::new();

    let db_started = Instant::now();
    let pool = match open_pool(&config.database).await {
        Ok(pool) => {
            checks.push(passed(
                "db_connectivity",
                db_started,
                format!("connected using `{}`", config.database.url),
            ));
            pool
        }
        Err(message) => {
            checks.push(failed("db_connectivity", db_started, message));
            checks.extend(DATABASE_CHECKS[1..].iter().copied().map(skipped));
            return checks;
        }
    };

    let migration_started = Instant::now();
    match migrations::run_pending(&pool).await {
        Ok(()) => checks.push(passed(
            "migration_visibility",
            migration_started,
            "migrations are visible and executable".to_string(),
        )),
        Err(error) => {
            checks.push(failed(
                "migration_visibility",
                migration_started,
                format!("migration execution failed: {error}"),
            ));
            checks.push(skipped("dispatch_round_trip"));
            pool.close().await;
            return checks;
        }
    }

    let dispatch_started = Instant::now();
    let outcome = dispatch_round_trip(SqlInvocationLog::new(pool.clone())).await;
    checks.push(match outcome {
        Ok(message) => passed("dispatch_round_trip", dispatch_started, message),
        Err(message) => failed("dispatch_round_trip", dispatch_started, message),
    });

    pool.close().await;
    checks
}

async fn dispatch_round_trip(log: SqlInvocationLog) -> Result<String, String> {
    let log = Arc::new(log);
    let registry = HandlerRegistry::standard().map_err(|error| error.to_string())?;
    let dispatcher = Dispatcher::new(Arc::new(registry), log.clone())
        .with_audit_policy(AuditPolicy::AllCalls);

    let request =
        InvocationRequest::new("query_agent", "generate_sql", json!({"dialect": "mysql"}));
    let response = dispatcher
        .handle(request)
        .await
        .map_err(|error| format!("dispatch failed: {error}"))?;
    let sql = response.result.get("sql").and_then(|sql| sql.as_str()).unwrap_or_default();
    if !sql.contains("NOW() - INTERVAL 3 MONTH") {
        return Err(format!("unexpected sql for mysql: `{sql}`"));
    }

    let recorded = log.recent(1).await.map_err(|error| format!("log read failed: {error}"))?;
    match recorded.first() {
        Some(record) if record.agent == "query_agent" => {
            Ok(format!("query_agent answered and was recorded as #{}", record.sequence_id))
        }
        _ => Err("invocation was not recorded in the log".to_string()),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn passed(name: &'static str, started: Instant, message: String) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Pass, elapsed_ms: elapsed_ms(started), message }
}

fn failed(name: &'static str, started: Instant, message: String) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Fail, elapsed_ms: elapsed_ms(started), message }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due to a previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed_count = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed_count}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        json!({
            "command": "smoke",
            "status": "fail",
            "summary": "serialization failed",
            "error": error.to_string(),
        })
        .to_string()
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
