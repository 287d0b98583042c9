//! Persistence boundary. Records are opaque JSON documents keyed by
//! `(candidate_id, kind)`; interview turns live in their own append-only log.

pub mod locks;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::ProfileAssessment;
use crate::enrichment::EnrichmentState;
use crate::interview::{InterviewPlan, InterviewTurn};
use crate::models::CandidateRecord;
use crate::scoring::CompositeScore;

pub use locks::CandidateLocks;
pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Candidate,
    Enrichment,
    Assessment,
    InterviewPlan,
    Score,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Candidate => "candidate",
            RecordKind::Enrichment => "enrichment",
            RecordKind::Assessment => "assessment",
            RecordKind::InterviewPlan => "interview_plan",
            RecordKind::Score => "score",
        }
    }

    /// Records the pipeline creates and may delete. The candidate record
    /// belongs to the caller.
    pub const PIPELINE_OWNED: [RecordKind; 4] = [
        RecordKind::Enrichment,
        RecordKind::Assessment,
        RecordKind::InterviewPlan,
        RecordKind::Score,
    ];
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type stored under one `RecordKind`.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const KIND: RecordKind;
}

impl Record for CandidateRecord {
    const KIND: RecordKind = RecordKind::Candidate;
}

impl Record for EnrichmentState {
    const KIND: RecordKind = RecordKind::Enrichment;
}

impl Record for ProfileAssessment {
    const KIND: RecordKind = RecordKind::Assessment;
}

impl Record for InterviewPlan {
    const KIND: RecordKind = RecordKind::InterviewPlan;
}

impl Record for CompositeScore {
    const KIND: RecordKind = RecordKind::Score;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, candidate_id: Uuid, kind: RecordKind) -> Result<Option<Value>, StoreError>;

    /// Inserts or replaces.
    async fn put(&self, candidate_id: Uuid, kind: RecordKind, value: Value) -> Result<(), StoreError>;

    /// Appends a turn and replaces the interview plan in one write. A second
    /// turn with the same index is a conflict and leaves both untouched.
    async fn record_answer(&self, turn: &InterviewTurn, plan: Value) -> Result<(), StoreError>;

    /// Turns in `turn_index` order.
    async fn list_turns(&self, candidate_id: Uuid) -> Result<Vec<InterviewTurn>, StoreError>;

    /// Removes every pipeline-owned record and turn for the candidate.
    async fn delete_pipeline_records(&self, candidate_id: Uuid) -> Result<(), StoreError>;

    /// Candidates registered for a job, each with its stored score if any.
    async fn list_scores_for_job(&self, job_id: i64) -> Result<Vec<JobScoreRow>, StoreError>;
}

/// Raw row behind the per-job dashboard.
#[derive(Debug, Clone)]
pub struct JobScoreRow {
    pub candidate: Value,
    pub score: Option<Value>,
}

pub async fn load<T: Record>(store: &dyn RecordStore, candidate_id: Uuid) -> Result<Option<T>, StoreError> {
    match store.get(candidate_id, T::KIND).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save<T: Record>(store: &dyn RecordStore, candidate_id: Uuid, record: &T) -> Result<(), StoreError> {
    let value = serde_json::to_value(record)?;
    store.put(candidate_id, T::KIND, value).await
}

pub async fn record_answer(store: &dyn RecordStore, turn: &InterviewTurn, plan: &InterviewPlan) -> Result<(), StoreError> {
    let value = serde_json::to_value(plan)?;
    store.record_answer(turn, value).await
}

pub async fn scores_for_job(
    store: &dyn RecordStore,
    job_id: i64,
) -> Result<Vec<(CandidateRecord, Option<CompositeScore>)>, StoreError> {
    store
        .list_scores_for_job(job_id)
        .await?
        .into_iter()
        .map(|row| -> Result<_, StoreError> {
            let candidate: CandidateRecord = serde_json::from_value(row.candidate)?;
            let score: Option<CompositeScore> = row.score.map(serde_json::from_value).transpose()?;
            Ok((candidate, score))
        })
        .collect()
}
