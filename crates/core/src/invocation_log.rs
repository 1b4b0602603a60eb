use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::invocation::{InvocationRecord, NewInvocationRecord, SequenceId};
use crate::errors::StorageError;

/// Append-only store of invocation records.
///
/// Implementations assign a unique, strictly increasing [`SequenceId`] per appended record and
/// must serialize concurrent appends so that no id is reused or skipped.
#[async_trait]
pub trait InvocationLog: Send + Sync {
    async fn append(&self, record: NewInvocationRecord) -> Result<InvocationRecord, StorageError>;

    /// Newest first, at most `limit` records.
    async fn recent(&self, limit: usize) -> Result<Vec<InvocationRecord>, StorageError>;
}

#[derive(Default)]
struct LogState {
    last_id: i64,
    records: Vec<InvocationRecord>,
}

/// Process-lifetime log held in memory.
#[derive(Default)]
pub struct InMemoryInvocationLog {
    state: Mutex<LogState>,
}

impl InMemoryInvocationLog {
    pub fn records(&self) -> Vec<InvocationRecord> {
        match self.state.lock() {
            Ok(state) => state.records.clone(),
            Err(poisoned) => poisoned.into_inner().records.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.records.len(),
            Err(poisoned) => poisoned.into_inner().records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InvocationLog for InMemoryInvocationLog {
    async fn append(&self, record: NewInvocationRecord) -> Result<InvocationRecord, StorageError> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        let next = state.last_id + 1;
        let stored = record.into_record(SequenceId(next), Utc::now());
        state.records.push(stored.clone());
        state.last_id = next;
        Ok(stored)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InvocationRecord>, StorageError> {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(state.records.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use serde_json::json;

    use crate::domain::invocation::{InvocationOutcome, InvocationRequest, NewInvocationRecord};
    use crate::invocation_log::{InMemoryInvocationLog, InvocationLog};

    fn record(agent: &str) -> NewInvocationRecord {
        let request = InvocationRequest::new(agent, "test", json!({}));
        NewInvocationRecord::succeeded(&request, &serde_json::Map::new(), 0.001)
    }

    #[tokio::test]
    async fn append_assigns_increasing_sequence_ids() {
        let log = InMemoryInvocationLog::default();

        let first = log.append(record("query_agent")).await.expect("append first");
        let second = log.append(record("mdm_agent")).await.expect("append second");

        assert_eq!(first.sequence_id.0, 1);
        assert_eq!(second.sequence_id.0, 2);
        assert_eq!(second.outcome, InvocationOutcome::Success);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn recent_returns_newest_first_and_respects_limit() {
        let log = InMemoryInvocationLog::default();
        for agent in ["a", "b", "c"] {
            log.append(record(agent)).await.expect("append");
        }

        let recent = log.recent(2).await.expect("recent");

        let agents: Vec<&str> = recent.iter().map(|record| record.agent.as_str()).collect();
        assert_eq!(agents, vec!["c", "b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_never_reuse_or_skip_ids() {
        let log = Arc::new(InMemoryInvocationLog::default());
        let mut tasks = Vec::new();
        for _ in 0..64 {
            let log = Arc::clone(&log);
            tasks.push(tokio::spawn(async move { log.append(record("query_agent")).await }));
        }

        let mut ids = BTreeSet::new();
        for task in tasks {
            let stored = task.await.expect("join").expect("append");
            assert!(ids.insert(stored.sequence_id.0), "sequence id reused");
        }

        assert_eq!(ids, (1..=64).collect::<BTreeSet<i64>>());
    }
}
