use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CandidateRecord, CodeHostingProfile, DataSource, ProfessionalProfile};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStage {
    Pending,
    Fetching,
    Analyzing,
    Completed,
    Failed,
}

impl EnrichmentStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, EnrichmentStage::Completed | EnrichmentStage::Failed)
    }

    /// Edges of the stage graph. Everything else is rejected.
    pub fn can_transition_to(self, next: EnrichmentStage) -> bool {
        use EnrichmentStage::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Fetching, Analyzing)
                | (Fetching, Pending)
                | (Fetching, Failed)
                | (Analyzing, Completed)
        )
    }
}

impl fmt::Display for EnrichmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnrichmentStage::Pending => "pending",
            EnrichmentStage::Fetching => "fetching",
            EnrichmentStage::Analyzing => "analyzing",
            EnrichmentStage::Completed => "completed",
            EnrichmentStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionError {
    pub from: EnrichmentStage,
    pub to: EnrichmentStage,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal enrichment transition {} -> {}", self.from, self.to)
    }
}

/// Per-candidate enrichment record. Only the orchestrator mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentState {
    pub candidate_id: Uuid,
    pub stage: EnrichmentStage,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub professional: Option<ProfessionalProfile>,
    pub code_hosting: Option<CodeHostingProfile>,
    /// Sources that failed permanently (bad link, profile gone).
    #[serde(default)]
    pub abandoned_sources: BTreeSet<DataSource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnrichmentState {
    pub fn new(candidate_id: Uuid, max_attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            candidate_id,
            stage: EnrichmentStage::Pending,
            attempt_count: 0,
            max_attempts,
            last_error: None,
            next_attempt_at: None,
            professional: None,
            code_hosting: None,
            abandoned_sources: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition(&mut self, to: EnrichmentStage, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.stage.can_transition_to(to) {
            return Err(TransitionError { from: self.stage, to });
        }
        self.stage = to;
        self.updated_at = now;
        Ok(())
    }

    /// `pending → fetching`, counting the attempt. Refuses to go past the
    /// attempt ceiling.
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) -> Result<u32, TransitionError> {
        if self.attempt_count >= self.max_attempts {
            return Err(TransitionError {
                from: self.stage,
                to: EnrichmentStage::Fetching,
            });
        }
        self.transition(EnrichmentStage::Fetching, now)?;
        self.attempt_count += 1;
        self.next_attempt_at = None;
        Ok(self.attempt_count)
    }

    pub fn attempts_remaining(&self) -> bool {
        self.attempt_count < self.max_attempts
    }

    pub fn has_payload(&self, source: DataSource) -> bool {
        match source {
            DataSource::ProfessionalNetwork => self.professional.is_some(),
            DataSource::CodeHosting => self.code_hosting.is_some(),
        }
    }

    pub fn has_any_payload(&self) -> bool {
        self.professional.is_some() || self.code_hosting.is_some()
    }

    /// Linked sources that still need a fetch.
    pub fn outstanding_sources(&self, candidate: &CandidateRecord) -> Vec<DataSource> {
        candidate
            .expected_sources()
            .into_iter()
            .filter(|s| !self.has_payload(*s) && !self.abandoned_sources.contains(s))
            .collect()
    }

    pub fn progress(&self) -> EnrichmentProgress {
        let (percentage, status_message) = match self.stage {
            EnrichmentStage::Pending if self.attempt_count == 0 => {
                (0, "Waiting to fetch third-party profiles".to_string())
            }
            EnrichmentStage::Pending => (
                20 * self.attempt_count.min(3) as u8,
                format!(
                    "Attempt {} of {} failed; retrying",
                    self.attempt_count, self.max_attempts
                ),
            ),
            EnrichmentStage::Fetching => (
                (20 * self.attempt_count.min(3)) as u8,
                format!("Fetching third-party profiles (attempt {} of {})", self.attempt_count, self.max_attempts),
            ),
            EnrichmentStage::Analyzing => (80, "Analyzing profile data".to_string()),
            EnrichmentStage::Completed if self.has_any_payload() => (100, "Profile enrichment complete".to_string()),
            EnrichmentStage::Completed => (100, "Completed without third-party data".to_string()),
            EnrichmentStage::Failed => (
                100,
                "Third-party profiles unavailable; assessed from resume only".to_string(),
            ),
        };
        EnrichmentProgress {
            candidate_id: self.candidate_id,
            stage: self.stage,
            attempt_count: self.attempt_count,
            max_attempts: self.max_attempts,
            percentage,
            status_message,
            last_error: self.last_error.clone(),
            next_attempt_at: self.next_attempt_at,
        }
    }
}

/// Externally observable progress snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichmentProgress {
    pub candidate_id: Uuid,
    pub stage: EnrichmentStage,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub percentage: u8,
    pub status_message: String,
    pub last_error: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::sample_candidate;

    fn state() -> EnrichmentState {
        EnrichmentState::new(Uuid::new_v4(), 3, Utc::now())
    }

    #[test]
    fn test_stage_graph() {
        use EnrichmentStage::*;
        assert!(Pending.can_transition_to(Fetching));
        assert!(Fetching.can_transition_to(Pending));
        assert!(Fetching.can_transition_to(Failed));
        assert!(Analyzing.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Fetching));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_begin_attempt_stops_at_ceiling() {
        let mut s = state();
        for n in 1..=3 {
            assert_eq!(s.begin_attempt(Utc::now()), Ok(n));
            s.transition(EnrichmentStage::Pending, Utc::now()).unwrap();
        }
        assert!(s.begin_attempt(Utc::now()).is_err());
        assert_eq!(s.attempt_count, 3);
        assert_eq!(s.stage, EnrichmentStage::Pending);
    }

    #[test]
    fn test_terminal_stage_cannot_restart() {
        let mut s = state();
        s.begin_attempt(Utc::now()).unwrap();
        s.transition(EnrichmentStage::Failed, Utc::now()).unwrap();
        assert!(s.begin_attempt(Utc::now()).is_err());
        assert_eq!(s.stage, EnrichmentStage::Failed);
    }

    #[test]
    fn test_outstanding_sources_skip_fetched_and_abandoned() {
        let mut c = sample_candidate();
        c.professional_profile_url = Some("https://www.linkedin.com/in/asha".into());
        c.code_hosting_url = Some("https://github.com/asha".into());
        let mut s = state();
        assert_eq!(s.outstanding_sources(&c).len(), 2);
        s.code_hosting = Some(CodeHostingProfile::default());
        s.abandoned_sources.insert(DataSource::ProfessionalNetwork);
        assert!(s.outstanding_sources(&c).is_empty());
    }

    #[test]
    fn test_progress_percentages() {
        let mut s = state();
        assert_eq!(s.progress().percentage, 0);
        s.begin_attempt(Utc::now()).unwrap();
        assert_eq!(s.progress().percentage, 20);
        s.transition(EnrichmentStage::Analyzing, Utc::now()).unwrap();
        assert_eq!(s.progress().percentage, 80);
        s.transition(EnrichmentStage::Completed, Utc::now()).unwrap();
        let p = s.progress();
        assert_eq!(p.percentage, 100);
        assert_eq!(p.stage, EnrichmentStage::Completed);
    }
}
