use std::collections::BTreeSet;
use std::sync::Arc;

use querymcp_agent::{Dispatcher, HandlerRegistry};
use querymcp_core::domain::invocation::{InvocationOutcome, InvocationRequest, ResponseStatus};
use querymcp_core::errors::DispatchError;
use querymcp_core::invocation_log::InvocationLog;
use querymcp_db::{connect, migrations, SqlInvocationLog};
use serde_json::json;

async fn sqlite_dispatcher() -> (Arc<Dispatcher>, Arc<SqlInvocationLog>) {
    let pool = connect("sqlite::memory:").await.expect("in-memory pool");
    migrations::run_pending(&pool).await.expect("migrations");
    let log = Arc::new(SqlInvocationLog::new(pool));
    let registry = Arc::new(HandlerRegistry::standard().expect("standard registry"));
    (Arc::new(Dispatcher::new(registry, log.clone())), log)
}

#[tokio::test]
async fn sql_generation_is_recorded_in_sqlite() {
    let (dispatcher, log) = sqlite_dispatcher().await;

    let response = dispatcher
        .handle(InvocationRequest::new("query_agent", "generate_sql", json!({"dialect": "mysql"})))
        .await
        .expect("query succeeds");

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(
        response.result["sql"],
        json!("SELECT region, AVG(margin) FROM product_data WHERE __time >= NOW() - INTERVAL 3 MONTH GROUP BY region;")
    );

    let records = log.recent(10).await.expect("recent records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].agent, "query_agent");
    assert_eq!(records[0].intent, "generate_sql");
    assert_eq!(records[0].outcome, InvocationOutcome::Success);
    let stored_payload: serde_json::Value =
        serde_json::from_str(&records[0].payload).expect("payload is json");
    assert_eq!(stored_payload, json!({"dialect": "mysql"}));
    let stored_result: serde_json::Value =
        serde_json::from_str(&records[0].result).expect("result is json");
    assert_eq!(stored_result, serde_json::Value::Object(response.result));
}

#[tokio::test]
async fn merge_scenario_mentions_entity_and_rule() {
    let (dispatcher, _log) = sqlite_dispatcher().await;

    let response = dispatcher
        .handle(InvocationRequest::new(
            "mdm_agent",
            "match_and_merge",
            json!({"entity_type": "customer", "survivorship": {"address": "most_recent"}}),
        ))
        .await
        .expect("merge succeeds");

    let message = response.result["message"].as_str().expect("message");
    assert!(message.contains("customer"));
    assert!(message.contains("address"));
}

#[tokio::test]
async fn unknown_agent_leaves_the_log_untouched() {
    let (dispatcher, log) = sqlite_dispatcher().await;

    let error = dispatcher
        .handle(InvocationRequest::new("unknown_agent", "x", json!({})))
        .await
        .expect_err("unknown agent");

    assert_eq!(error, DispatchError::UnknownAgent { agent: "unknown_agent".to_string() });
    assert!(log.recent(10).await.expect("recent").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_dispatches_share_one_gapless_sequence() {
    let (dispatcher, log) = sqlite_dispatcher().await;
    let callers = 60_usize;

    let mut tasks = Vec::with_capacity(callers);
    for index in 0..callers {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            let request = match index % 3 {
                0 => InvocationRequest::new("query_agent", "generate_sql", json!({})),
                1 => InvocationRequest::new("mdm_agent", "match_and_merge", json!({})),
                _ => InvocationRequest::new("workflow_agent", "create_workflow", json!({})),
            };
            dispatcher.handle(request).await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("dispatch succeeds");
    }

    let records = log.recent(500).await.expect("recent records");
    let ids: BTreeSet<i64> = records.iter().map(|record| record.sequence_id.0).collect();
    assert_eq!(records.len(), callers);
    assert_eq!(ids, (1..=callers as i64).collect::<BTreeSet<i64>>());
}
