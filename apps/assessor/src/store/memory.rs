use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::interview::InterviewTurn;
use crate::store::{JobScoreRow, RecordKind, RecordStore, StoreError};

/// In-process store for tests and database-less local runs.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<(Uuid, RecordKind), Value>>,
    turns: RwLock<HashMap<Uuid, BTreeMap<usize, InterviewTurn>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, candidate_id: Uuid, kind: RecordKind) -> Result<Option<Value>, StoreError> {
        Ok(self.records.read().await.get(&(candidate_id, kind)).cloned())
    }

    async fn put(&self, candidate_id: Uuid, kind: RecordKind, value: Value) -> Result<(), StoreError> {
        self.records.write().await.insert((candidate_id, kind), value);
        Ok(())
    }

    async fn record_answer(&self, turn: &InterviewTurn, plan: Value) -> Result<(), StoreError> {
        // Same lock order as delete_pipeline_records.
        let mut records = self.records.write().await;
        let mut turns = self.turns.write().await;
        let log = turns.entry(turn.candidate_id).or_default();
        if log.contains_key(&turn.turn_index) {
            return Err(StoreError::Conflict(format!(
                "turn {} already recorded for {}",
                turn.turn_index, turn.candidate_id
            )));
        }
        log.insert(turn.turn_index, turn.clone());
        records.insert((turn.candidate_id, RecordKind::InterviewPlan), plan);
        Ok(())
    }

    async fn list_turns(&self, candidate_id: Uuid) -> Result<Vec<InterviewTurn>, StoreError> {
        Ok(self
            .turns
            .read()
            .await
            .get(&candidate_id)
            .map(|log| log.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_pipeline_records(&self, candidate_id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        for kind in RecordKind::PIPELINE_OWNED {
            records.remove(&(candidate_id, kind));
        }
        self.turns.write().await.remove(&candidate_id);
        Ok(())
    }

    async fn list_scores_for_job(&self, job_id: i64) -> Result<Vec<JobScoreRow>, StoreError> {
        let records = self.records.read().await;
        let mut rows: Vec<(Uuid, JobScoreRow)> = records
            .iter()
            .filter(|((_, kind), body)| *kind == RecordKind::Candidate && body["job_id"].as_i64() == Some(job_id))
            .map(|((id, _), body)| {
                let row = JobScoreRow {
                    candidate: body.clone(),
                    score: records.get(&(*id, RecordKind::Score)).cloned(),
                };
                (*id, row)
            })
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }
}
