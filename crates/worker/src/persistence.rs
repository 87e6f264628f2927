// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relational persistence for worker jobs.
//!
//! A single `analysis_jobs` table; one upsert per state transition. The
//! store serializes writes per record, so the last persisted row always
//! matches the last caller-visible state.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::Row;

use gz_core::{DynamicProfile, WorkerJob, WorkerJobId, WorkerStatus};

use crate::error::PersistenceError;

/// Store operations required by the job store.
#[async_trait]
pub trait JobPersistence: Send + Sync {
    /// Create the table and status index if missing.
    async fn ensure_schema(&self) -> Result<(), PersistenceError>;

    async fn load_all(&self) -> Result<Vec<WorkerJob>, PersistenceError>;

    async fn upsert(&self, job: &WorkerJob) -> Result<(), PersistenceError>;
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS analysis_jobs (
    id TEXT PRIMARY KEY,
    source_code TEXT NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    cancel_requested BOOLEAN NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    error TEXT,
    result JSONB,
    retry_of TEXT
)
"#;

const CREATE_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_analysis_jobs_status ON analysis_jobs (status)";

const UPSERT: &str = r#"
INSERT INTO analysis_jobs
    (id, source_code, status, attempts, cancel_requested, created_at, updated_at, error, result, retry_of)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
ON CONFLICT (id) DO UPDATE SET
    source_code = EXCLUDED.source_code,
    status = EXCLUDED.status,
    attempts = EXCLUDED.attempts,
    cancel_requested = EXCLUDED.cancel_requested,
    updated_at = EXCLUDED.updated_at,
    error = EXCLUDED.error,
    result = EXCLUDED.result,
    retry_of = EXCLUDED.retry_of
"#;

const SELECT_ALL: &str = r#"
SELECT id, source_code, status, attempts, cancel_requested, created_at, updated_at,
       error, result, retry_of
FROM analysis_jobs
"#;

fn epoch_ms_to_datetime(epoch_ms: u64) -> DateTime<Utc> {
    let secs = (epoch_ms / 1000) as i64;
    let nanos = ((epoch_ms % 1000) * 1_000_000) as u32;
    Utc.timestamp_opt(secs, nanos).single().unwrap_or_else(Utc::now)
}

fn datetime_to_epoch_ms(dt: DateTime<Utc>) -> u64 {
    dt.timestamp_millis().max(0) as u64
}

/// Postgres-backed persistence.
pub struct PgPersistence {
    pool: sqlx::PgPool,
}

impl PgPersistence {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    fn row_to_job(row: &sqlx::postgres::PgRow) -> Result<WorkerJob, PersistenceError> {
        let db = |e: sqlx::Error| PersistenceError(e.to_string());

        let id: String = row.try_get("id").map_err(db)?;
        let status: String = row.try_get("status").map_err(db)?;
        let status: WorkerStatus = status.parse().map_err(PersistenceError)?;
        let attempts: i32 = row.try_get("attempts").map_err(db)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(db)?;
        let result: Option<serde_json::Value> = row.try_get("result").map_err(db)?;
        let result: Option<DynamicProfile> = match result {
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| PersistenceError(format!("bad result JSON for {id}: {e}")))?,
            ),
            None => None,
        };
        let retry_of: Option<String> = row.try_get("retry_of").map_err(db)?;

        Ok(WorkerJob {
            id: WorkerJobId::from_string(&id),
            source: row.try_get("source_code").map_err(db)?,
            status,
            attempts: attempts.max(0) as u32,
            cancel_requested: row.try_get("cancel_requested").map_err(db)?,
            created_at_ms: datetime_to_epoch_ms(created_at),
            updated_at_ms: datetime_to_epoch_ms(updated_at),
            error: row.try_get("error").map_err(db)?,
            result,
            retry_of: retry_of.map(WorkerJobId::from_string),
        })
    }
}

#[async_trait]
impl JobPersistence for PgPersistence {
    async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError(e.to_string()))?;
        sqlx::query(CREATE_STATUS_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError(e.to_string()))?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<WorkerJob>, PersistenceError> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PersistenceError(e.to_string()))?;
        rows.iter().map(Self::row_to_job).collect()
    }

    async fn upsert(&self, job: &WorkerJob) -> Result<(), PersistenceError> {
        let result_json = match &job.result {
            Some(profile) => Some(
                serde_json::to_value(profile)
                    .map_err(|e| PersistenceError(format!("unserializable result: {e}")))?,
            ),
            None => None,
        };
        sqlx::query(UPSERT)
            .bind(job.id.as_str())
            .bind(&job.source)
            .bind(job.status.to_string())
            .bind(job.attempts as i32)
            .bind(job.cancel_requested)
            .bind(epoch_ms_to_datetime(job.created_at_ms))
            .bind(epoch_ms_to_datetime(job.updated_at_ms))
            .bind(job.error.as_deref())
            .bind(result_json)
            .bind(job.retry_of.as_ref().map(|id| id.as_str().to_string()))
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError(e.to_string()))?;
        Ok(())
    }
}

/// In-memory persistence for tests and store-consistency checks.
pub struct MemoryPersistence {
    rows: parking_lot::Mutex<std::collections::HashMap<String, WorkerJob>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self { rows: parking_lot::Mutex::new(std::collections::HashMap::new()) }
    }
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobPersistence for MemoryPersistence {
    async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<WorkerJob>, PersistenceError> {
        Ok(self.rows.lock().values().cloned().collect())
    }

    async fn upsert(&self, job: &WorkerJob) -> Result<(), PersistenceError> {
        self.rows.lock().insert(job.id.to_string(), job.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
