use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tokio::sync::Mutex;

use querymcp_core::domain::invocation::{
    InvocationOutcome, InvocationRecord, NewInvocationRecord, SequenceId,
};
use querymcp_core::errors::StorageError;
use querymcp_core::invocation_log::InvocationLog;

use super::RepositoryError;
use crate::DbPool;

/// SQLite-backed invocation log. Appends go through a single writer guard so ids are
/// handed out one insert at a time.
pub struct SqlInvocationLog {
    pool: DbPool,
    writer: Mutex<()>,
}

impl SqlInvocationLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, writer: Mutex::new(()) }
    }

    async fn insert(
        &self,
        record: NewInvocationRecord,
    ) -> Result<InvocationRecord, RepositoryError> {
        let _writer = self.writer.lock().await;
        let recorded_at = Utc::now();

        let done = sqlx::query(
            r#"
            INSERT INTO invocation_log (
                agent, intent, payload, result, duration, outcome, error, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.agent)
        .bind(&record.intent)
        .bind(&record.payload)
        .bind(&record.result)
        .bind(record.duration_secs)
        .bind(record.outcome.as_str())
        .bind(&record.error)
        .bind(recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(record.into_record(SequenceId(done.last_insert_rowid()), recorded_at))
    }

    async fn select_recent(&self, limit: usize) -> Result<Vec<InvocationRecord>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, agent, intent, payload, result, duration, outcome, error, recorded_at
            FROM invocation_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl InvocationLog for SqlInvocationLog {
    async fn append(&self, record: NewInvocationRecord) -> Result<InvocationRecord, StorageError> {
        Ok(self.insert(record).await?)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InvocationRecord>, StorageError> {
        Ok(self.select_recent(limit).await?)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<InvocationRecord, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let agent: String =
        row.try_get("agent").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let intent: String =
        row.try_get("intent").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let payload: String =
        row.try_get("payload").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let result: String =
        row.try_get("result").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let duration_secs: f64 =
        row.try_get("duration").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let outcome_str: String =
        row.try_get("outcome").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let error: Option<String> =
        row.try_get("error").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let recorded_at_str: String =
        row.try_get("recorded_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let outcome = InvocationOutcome::parse(&outcome_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown outcome `{outcome_str}`")))?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(InvocationRecord {
        sequence_id: SequenceId(id),
        agent,
        intent,
        payload,
        result,
        duration_secs,
        outcome,
        error,
        recorded_at,
    })
}
