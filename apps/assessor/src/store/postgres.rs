use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::interview::InterviewTurn;
use crate::store::{JobScoreRow, RecordKind, RecordStore, StoreError};

/// JSONB-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, candidate_id: Uuid, kind: RecordKind) -> Result<Option<Value>, StoreError> {
        let row: Option<Value> = sqlx::query_scalar(
            "SELECT body FROM assessment_records WHERE candidate_id = $1 AND kind = $2",
        )
        .bind(candidate_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn put(&self, candidate_id: Uuid, kind: RecordKind, value: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO assessment_records (candidate_id, kind, body, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (candidate_id, kind)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(candidate_id)
        .bind(kind.as_str())
        .bind(value)
        .execute(&self.pool)
        .await?;
        debug!(%candidate_id, %kind, "record stored");
        Ok(())
    }

    async fn record_answer(&self, turn: &InterviewTurn, plan: Value) -> Result<(), StoreError> {
        let body = serde_json::to_value(turn)?;
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO interview_turns (candidate_id, turn_index, body, answered_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (candidate_id, turn_index) DO NOTHING
            "#,
        )
        .bind(turn.candidate_id)
        .bind(turn.turn_index as i32)
        .bind(body)
        .bind(turn.answered_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if inserted == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::Conflict(format!(
                "turn {} already recorded for {}",
                turn.turn_index, turn.candidate_id
            )));
        }
        sqlx::query(
            r#"
            INSERT INTO assessment_records (candidate_id, kind, body, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (candidate_id, kind)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(turn.candidate_id)
        .bind(RecordKind::InterviewPlan.as_str())
        .bind(plan)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        debug!(candidate_id = %turn.candidate_id, turn_index = turn.turn_index, "answer recorded");
        Ok(())
    }

    async fn list_turns(&self, candidate_id: Uuid) -> Result<Vec<InterviewTurn>, StoreError> {
        let rows: Vec<Value> = sqlx::query_scalar(
            "SELECT body FROM interview_turns WHERE candidate_id = $1 ORDER BY turn_index",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|v| serde_json::from_value(v).map_err(StoreError::from))
            .collect()
    }

    async fn delete_pipeline_records(&self, candidate_id: Uuid) -> Result<(), StoreError> {
        let kinds: Vec<&str> = RecordKind::PIPELINE_OWNED.iter().map(|k| k.as_str()).collect();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM assessment_records WHERE candidate_id = $1 AND kind = ANY($2)")
            .bind(candidate_id)
            .bind(&kinds)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM interview_turns WHERE candidate_id = $1")
            .bind(candidate_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_scores_for_job(&self, job_id: i64) -> Result<Vec<JobScoreRow>, StoreError> {
        let rows: Vec<(Value, Option<Value>)> = sqlx::query_as(
            r#"
            SELECT c.body, s.body
            FROM assessment_records c
            LEFT JOIN assessment_records s
                ON s.candidate_id = c.candidate_id AND s.kind = $2
            WHERE c.kind = $1 AND (c.body->>'job_id')::BIGINT = $3
            ORDER BY c.candidate_id
            "#,
        )
        .bind(RecordKind::Candidate.as_str())
        .bind(RecordKind::Score.as_str())
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(candidate, score)| JobScoreRow { candidate, score })
            .collect())
    }
}
