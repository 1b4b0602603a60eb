use crate::commands::{block_on, open_pool};
use querymcp_agent::HandlerRegistry;
use querymcp_core::config::{AppConfig, LoadOptions};
use querymcp_db::is_in_memory;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            serde_json::json!({
                "overall_status": "fail",
                "summary": "doctor serialization failed",
                "error": error.to_string(),
            })
            .to_string()
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = vec![check_handler_registry()];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_handler_registry() -> DoctorCheck {
    match HandlerRegistry::standard() {
        Ok(registry) => DoctorCheck {
            name: "handler_registry",
            status: CheckStatus::Pass,
            details: format!(
                "{} agents registered: {}",
                registry.len(),
                describe_agents(&registry)
            ),
        },
        Err(error) => DoctorCheck {
            name: "handler_registry",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn describe_agents(registry: &HandlerRegistry) -> String {
    registry
        .describe()
        .into_iter()
        .map(|(name, description)| format!("{name} ({description})"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let result = block_on(async {
        let pool = open_pool(&config.database).await?;
        pool.close().await;
        Ok::<(), String>(())
    })
    .and_then(|connected| connected);

    match result {
        Ok(()) => {
            let mut details = format!("connected using `{}`", config.database.url);
            if is_in_memory(&config.database.url) {
                details.push_str("; records are kept only while the server process runs");
            }
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Pass, details }
        }
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
