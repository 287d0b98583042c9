//! The operations exposed over HTTP. Each one loads what it needs from the
//! record store, runs one pipeline stage on immutable snapshots, and writes
//! the result back under the candidate's lock.

pub mod dashboard;
pub mod handlers;
pub mod ingest;

#[cfg(test)]
pub(crate) mod tests;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisInput, ProfileAnalyzer, ProfileAssessment};
use crate::config::PipelineConfig;
use crate::enrichment::orchestrator::{CodeFetcher, ProfessionalFetcher};
use crate::enrichment::{EnrichmentOrchestrator, EnrichmentProgress, EnrichmentStage, EnrichmentState};
use crate::errors::AppError;
use crate::interview::{InterviewPlan, InterviewPlanner, InterviewTurn, PlanRequest, QuestionPhraser, QuestionPrompt};
use crate::models::CandidateRecord;
use crate::scoring::{CompositeScore, HolisticReviewer, ScoringEngine, ScoringInput};
use crate::signals::SignalExtractor;
use crate::store::{self, CandidateLocks, RecordStore};
use crate::upstream::{resolve_job, JobSource};

use self::dashboard::{DashboardFilter, JobAnalytics, JobDashboard};
use self::ingest::ResumeIngest;

/// External collaborators. The augmentation hooks are optional; without
/// them scoring uses the fallback path and questions keep their template
/// wording.
pub struct PipelineDeps {
    pub store: Arc<dyn RecordStore>,
    pub jobs: Arc<dyn JobSource>,
    pub professional: ProfessionalFetcher,
    pub code_hosting: CodeFetcher,
    pub reviewer: Option<Arc<dyn HolisticReviewer>>,
    pub phraser: Option<Arc<dyn QuestionPhraser>>,
}

pub struct AssessmentService {
    store: Arc<dyn RecordStore>,
    locks: CandidateLocks,
    jobs: Arc<dyn JobSource>,
    signals: SignalExtractor,
    analyzer: Arc<ProfileAnalyzer>,
    enrichment: EnrichmentOrchestrator,
    planner: InterviewPlanner,
    scoring: ScoringEngine,
    phraser: Option<Arc<dyn QuestionPhraser>>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredCandidate {
    pub candidate: CandidateRecord,
    pub enrichment: EnrichmentProgress,
}

#[derive(Debug, Serialize)]
pub struct InterviewView {
    pub plan: InterviewPlan,
    pub current_question: Option<QuestionPrompt>,
    pub turns_recorded: usize,
}

#[derive(Debug, Serialize)]
pub struct AnswerReceipt {
    pub turn: InterviewTurn,
    pub follow_up_inserted: bool,
    pub completed: bool,
    pub next_question: Option<QuestionPrompt>,
}

impl AssessmentService {
    pub fn new(config: PipelineConfig, deps: PipelineDeps) -> Self {
        let PipelineConfig {
            signals,
            analyzer,
            enrichment,
            interview,
            scoring,
        } = config;
        let extractor = SignalExtractor::new(&signals);
        let low_completeness = analyzer.low_completeness_threshold;
        let analyzer = Arc::new(ProfileAnalyzer::new(analyzer, scoring.role_fit.clone(), extractor.clone()));
        let locks = CandidateLocks::new();
        let orchestrator = EnrichmentOrchestrator::new(
            enrichment,
            deps.store.clone(),
            locks.clone(),
            deps.jobs.clone(),
            analyzer.clone(),
            deps.professional,
            deps.code_hosting,
        );
        Self {
            store: deps.store,
            locks,
            jobs: deps.jobs,
            signals: extractor.clone(),
            analyzer,
            enrichment: orchestrator,
            planner: InterviewPlanner::new(interview, extractor, low_completeness),
            scoring: ScoringEngine::new(scoring, deps.reviewer),
            phraser: deps.phraser,
        }
    }

    async fn candidate(&self, candidate_id: Uuid) -> Result<CandidateRecord, AppError> {
        store::load::<CandidateRecord>(&*self.store, candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))
    }

    // ── Candidates ──────────────────────────────────────────────────────────

    /// Stores the candidate and creates its enrichment record in `pending`.
    pub async fn register_candidate(&self, candidate: CandidateRecord) -> Result<RegisteredCandidate, AppError> {
        if candidate.full_name.trim().is_empty() {
            return Err(AppError::Validation("full_name must not be empty".to_string()));
        }
        let candidate_id = candidate.id;
        {
            let _guard = self.locks.lock(candidate_id).await;
            if store::load::<CandidateRecord>(&*self.store, candidate_id).await?.is_some() {
                return Err(AppError::PreconditionFailed(format!(
                    "Candidate {candidate_id} is already registered"
                )));
            }
            store::save(&*self.store, candidate_id, &candidate).await?;
        }
        let state = self.enrichment.init_state(candidate_id).await?;
        info!(%candidate_id, sources = candidate.expected_sources().len(), "candidate registered");
        Ok(RegisteredCandidate {
            candidate,
            enrichment: state.progress(),
        })
    }

    /// Replaces the resume text from an upload. Links and skills found in it
    /// fill fields the caller left empty.
    pub async fn ingest_resume(
        &self,
        candidate_id: Uuid,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<ResumeIngest, AppError> {
        let text = ingest::extract_text(bytes, content_type).await?;
        let _guard = self.locks.lock(candidate_id).await;
        let mut candidate = self.candidate(candidate_id).await?;
        let report = ingest::apply_resume(&mut candidate, text, &self.signals);
        store::save(&*self.store, candidate_id, &candidate).await?;
        info!(
            %candidate_id,
            characters = report.characters,
            links_added = report.links_added.len(),
            skills_detected = report.skills_detected.len(),
            "resume ingested"
        );
        Ok(report)
    }

    /// Cancels in-flight enrichment and deletes every record the pipeline
    /// created. The candidate record itself is left alone.
    pub async fn abandon_candidate(&self, candidate_id: Uuid) -> Result<(), AppError> {
        let cancelled = self.enrichment.cancel(candidate_id);
        {
            let _guard = self.locks.lock(candidate_id).await;
            self.candidate(candidate_id).await?;
            self.store.delete_pipeline_records(candidate_id).await?;
        }
        self.locks.forget(candidate_id);
        info!(%candidate_id, cancelled, "candidate abandoned");
        Ok(())
    }

    // ── Enrichment and assessment ───────────────────────────────────────────

    pub async fn start_enrichment(&self, candidate_id: Uuid) -> Result<EnrichmentProgress, AppError> {
        Ok(self.enrichment.start(candidate_id).await?)
    }

    pub async fn get_enrichment_status(&self, candidate_id: Uuid) -> Result<EnrichmentProgress, AppError> {
        self.enrichment
            .status(candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No enrichment record for candidate {candidate_id}")))
    }

    pub async fn get_assessment(&self, candidate_id: Uuid) -> Result<ProfileAssessment, AppError> {
        store::load::<ProfileAssessment>(&*self.store, candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No assessment for candidate {candidate_id} yet")))
    }

    /// Recomputes the assessment from the stored payloads. Only allowed once
    /// enrichment is terminal; the previous snapshot is replaced.
    pub async fn reassess(&self, candidate_id: Uuid) -> Result<ProfileAssessment, AppError> {
        let candidate = self.candidate(candidate_id).await?;
        let job = resolve_job(&*self.jobs, candidate.job_id).await;

        let _guard = self.locks.lock(candidate_id).await;
        let candidate = self.candidate(candidate_id).await?;
        let state = store::load::<EnrichmentState>(&*self.store, candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No enrichment record for candidate {candidate_id}")))?;
        if !state.stage.is_terminal() {
            return Err(AppError::PreconditionFailed(format!(
                "Enrichment is still {}; the assessment is computed when it finishes",
                state.stage
            )));
        }
        let assessment = self.analyzer.analyze(AnalysisInput {
            candidate: &candidate,
            job: &job,
            professional: state.professional.as_ref(),
            code_hosting: state.code_hosting.as_ref(),
            as_of: Utc::now().date_naive(),
        });
        store::save(&*self.store, candidate_id, &assessment).await?;
        info!(%candidate_id, degraded = assessment.degraded, "assessment recomputed");
        Ok(assessment)
    }

    // ── Interview ───────────────────────────────────────────────────────────

    /// Plans the interview and emits its first question. `force` allows a
    /// generic plan while enrichment is still running.
    pub async fn start_interview(&self, candidate_id: Uuid, force: bool) -> Result<InterviewView, AppError> {
        let candidate = self.candidate(candidate_id).await?;
        let job = resolve_job(&*self.jobs, candidate.job_id).await;

        let (plan, question) = {
            let _guard = self.locks.lock(candidate_id).await;
            self.candidate(candidate_id).await?;
            if let Some(existing) = store::load::<InterviewPlan>(&*self.store, candidate_id).await? {
                return Err(AppError::PreconditionFailed(format!(
                    "Interview is already {:?}",
                    existing.status
                )));
            }
            let stage = store::load::<EnrichmentState>(&*self.store, candidate_id)
                .await?
                .map(|s| s.stage)
                .unwrap_or(EnrichmentStage::Pending);
            let assessment = store::load::<ProfileAssessment>(&*self.store, candidate_id).await?;

            let now = Utc::now();
            let mut plan = self.planner.plan(PlanRequest {
                candidate_id,
                enrichment_stage: stage,
                assessment: assessment.as_ref(),
                job: &job,
                force,
                now,
            })?;
            let question = self.planner.next_question(&mut plan, now)?;
            store::save(&*self.store, candidate_id, &plan).await?;
            (plan, question)
        };

        let question = match question {
            Some(q) => Some(self.phrase(candidate_id, q, &plan.context.role).await?),
            None => None,
        };
        Ok(InterviewView {
            plan: self.load_plan(candidate_id).await?,
            current_question: question,
            turns_recorded: 0,
        })
    }

    /// Records the answer to the outstanding question and emits the next one.
    pub async fn submit_answer(&self, candidate_id: Uuid, answer: &str) -> Result<AnswerReceipt, AppError> {
        let (outcome, next, role) = {
            let _guard = self.locks.lock(candidate_id).await;
            let mut plan = self.load_plan(candidate_id).await?;
            let turn_index = self.store.list_turns(candidate_id).await?.len();

            let now = Utc::now();
            let outcome = self.planner.submit_answer(&mut plan, answer, turn_index, now)?;
            let next = if outcome.completed {
                None
            } else {
                self.planner.next_question(&mut plan, now)?
            };
            store::record_answer(&*self.store, &outcome.turn, &plan).await?;
            (outcome, next, plan.context.role.clone())
        };

        let next_question = match next {
            Some(q) => Some(self.phrase(candidate_id, q, &role).await?),
            None => None,
        };
        Ok(AnswerReceipt {
            turn: outcome.turn,
            follow_up_inserted: outcome.follow_up_inserted,
            completed: outcome.completed,
            next_question,
        })
    }

    pub async fn get_interview_plan(&self, candidate_id: Uuid) -> Result<InterviewView, AppError> {
        let plan = self.load_plan(candidate_id).await?;
        let turns_recorded = self.store.list_turns(candidate_id).await?.len();
        Ok(InterviewView {
            current_question: self.planner.current_question(&plan),
            plan,
            turns_recorded,
        })
    }

    async fn load_plan(&self, candidate_id: Uuid) -> Result<InterviewPlan, AppError> {
        match store::load::<InterviewPlan>(&*self.store, candidate_id).await? {
            Some(plan) => Ok(plan),
            None => {
                self.candidate(candidate_id).await?;
                Err(AppError::PreconditionFailed("Interview has not been started".to_string()))
            }
        }
    }

    /// Swaps in reworded text for the outstanding question when a phraser is
    /// configured. The plan is re-read under the lock and only touched if
    /// the same question is still outstanding.
    async fn phrase(&self, candidate_id: Uuid, prompt: QuestionPrompt, role: &str) -> Result<QuestionPrompt, AppError> {
        let Some(phraser) = &self.phraser else {
            return Ok(prompt);
        };
        let text = match phraser.rephrase(&prompt, role).await {
            Ok(text) => text,
            Err(e) => {
                warn!(%candidate_id, error = %e, "question rephrasing failed, keeping template wording");
                return Ok(prompt);
            }
        };

        let _guard = self.locks.lock(candidate_id).await;
        let Some(mut plan) = store::load::<InterviewPlan>(&*self.store, candidate_id).await? else {
            return Ok(prompt);
        };
        let still_current = self
            .planner
            .current_question(&plan)
            .is_some_and(|p| p.slot_index == prompt.slot_index && p.text == prompt.text);
        if !still_current {
            return Ok(prompt);
        }
        plan.rephrase_current(text);
        store::save(&*self.store, candidate_id, &plan).await?;
        Ok(self.planner.current_question(&plan).unwrap_or(prompt))
    }

    // ── Scoring ─────────────────────────────────────────────────────────────

    /// Returns the stored score, computing it first if there is none.
    pub async fn compute_score(&self, candidate_id: Uuid, force: bool) -> Result<CompositeScore, AppError> {
        if let Some(score) = store::load::<CompositeScore>(&*self.store, candidate_id).await? {
            return Ok(score);
        }
        self.recompute_score(candidate_id, force).await
    }

    /// Computes a fresh score and overwrites the stored one.
    pub async fn recompute_score(&self, candidate_id: Uuid, force: bool) -> Result<CompositeScore, AppError> {
        let candidate = self.candidate(candidate_id).await?;
        let assessment = store::load::<ProfileAssessment>(&*self.store, candidate_id)
            .await?
            .ok_or_else(|| {
                AppError::PreconditionFailed("No assessment yet; scoring waits for enrichment to finish".to_string())
            })?;
        let plan = store::load::<InterviewPlan>(&*self.store, candidate_id).await?;
        let turns = self.store.list_turns(candidate_id).await?;
        let job = resolve_job(&*self.jobs, candidate.job_id).await;

        let score = self
            .scoring
            .score(&ScoringInput {
                candidate: &candidate,
                job: &job,
                assessment: &assessment,
                plan: plan.as_ref(),
                turns: &turns,
                force,
                now: Utc::now(),
            })
            .await?;

        let _guard = self.locks.lock(candidate_id).await;
        self.candidate(candidate_id).await?;
        store::save(&*self.store, candidate_id, &score).await?;
        Ok(score)
    }

    // ── Dashboard ───────────────────────────────────────────────────────────

    /// Scored candidates for a job, best fit first.
    pub async fn job_dashboard(&self, job_id: i64, filter: DashboardFilter) -> Result<JobDashboard, AppError> {
        let rows = store::scores_for_job(&*self.store, job_id).await?;
        let job = resolve_job(&*self.jobs, Some(job_id)).await;
        let dashboard = dashboard::build_dashboard(job_id, job.title, rows, filter);
        info!(
            job_id,
            listed = dashboard.candidates.len(),
            scored = dashboard.total_count,
            "dashboard built"
        );
        Ok(dashboard)
    }

    pub async fn job_analytics(&self, job_id: i64) -> Result<JobAnalytics, AppError> {
        let rows = store::scores_for_job(&*self.store, job_id).await?;
        Ok(dashboard::analyze_pool(job_id, &rows, Utc::now()))
    }
}
