//! Drives `pending → fetching → analyzing → completed | failed` for one
//! candidate per task.
//!
//! Suspension points are the backoff sleep and the fetch itself, both raced
//! against the candidate's cancellation token. Every state write happens
//! under the candidate's lock and re-checks cancellation first, so an
//! abandoned candidate never gets an assessment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisInput, ProfileAnalyzer};
use crate::enrichment::state::TransitionError;
use crate::enrichment::{
    EnrichmentConfig, EnrichmentProgress, EnrichmentStage, EnrichmentState, FetchError, ProfileFetcher,
};
use crate::models::{CandidateRecord, CodeHostingProfile, DataSource, JobRequirement, ProfessionalProfile};
use crate::store::{self, CandidateLocks, RecordStore, StoreError};
use crate::upstream::{resolve_job, JobSource};

pub type ProfessionalFetcher = Arc<dyn ProfileFetcher<Payload = ProfessionalProfile>>;
pub type CodeFetcher = Arc<dyn ProfileFetcher<Payload = CodeHostingProfile>>;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("candidate {0} not found")]
    CandidateNotFound(Uuid),

    #[error("enrichment for {0} was cancelled")]
    Cancelled(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Transition(String),
}

impl From<TransitionError> for EnrichmentError {
    fn from(e: TransitionError) -> Self {
        EnrichmentError::Transition(e.to_string())
    }
}

/// Results of one attempt. `None` means the source was not fetched.
struct FetchOutcome {
    professional: Option<Result<ProfessionalProfile, FetchError>>,
    code_hosting: Option<Result<CodeHostingProfile, FetchError>>,
}

/// Registry entry for a spawned task. `generation` tells a finished task
/// apart from a newer one started for the same candidate.
struct TaskEntry {
    generation: u64,
    token: CancellationToken,
}

enum Next {
    Retry(Duration),
    Analyze,
    Fail,
}

#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    config: Arc<EnrichmentConfig>,
    store: Arc<dyn RecordStore>,
    locks: CandidateLocks,
    jobs: Arc<dyn JobSource>,
    analyzer: Arc<ProfileAnalyzer>,
    professional: ProfessionalFetcher,
    code_hosting: CodeFetcher,
    permits: Arc<Semaphore>,
    tasks: Arc<Mutex<HashMap<Uuid, TaskEntry>>>,
    generations: Arc<AtomicU64>,
}

impl EnrichmentOrchestrator {
    pub fn new(
        config: EnrichmentConfig,
        store: Arc<dyn RecordStore>,
        locks: CandidateLocks,
        jobs: Arc<dyn JobSource>,
        analyzer: Arc<ProfileAnalyzer>,
        professional: ProfessionalFetcher,
        code_hosting: CodeFetcher,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.concurrency_limit.max(1)));
        Self {
            config: Arc::new(config),
            store,
            locks,
            jobs,
            analyzer,
            professional,
            code_hosting,
            permits,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Ensures the candidate has an enrichment record, creating it in
    /// `pending` when absent.
    pub async fn init_state(&self, candidate_id: Uuid) -> Result<EnrichmentState, EnrichmentError> {
        let _guard = self.locks.lock(candidate_id).await;
        self.load_or_init(candidate_id).await
    }

    async fn load_or_init(&self, candidate_id: Uuid) -> Result<EnrichmentState, EnrichmentError> {
        if let Some(state) = store::load::<EnrichmentState>(&*self.store, candidate_id).await? {
            return Ok(state);
        }
        let state = EnrichmentState::new(candidate_id, self.config.max_attempts, Utc::now());
        store::save(&*self.store, candidate_id, &state).await?;
        Ok(state)
    }

    pub async fn status(&self, candidate_id: Uuid) -> Result<Option<EnrichmentProgress>, EnrichmentError> {
        let state = store::load::<EnrichmentState>(&*self.store, candidate_id).await?;
        Ok(state.map(|s| s.progress()))
    }

    pub fn is_running(&self, candidate_id: Uuid) -> bool {
        self.registry().contains_key(&candidate_id)
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, TaskEntry>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawns the enrichment task unless one is running or the stage is
    /// already terminal. Returns the progress at the time of the call.
    pub async fn start(&self, candidate_id: Uuid) -> Result<EnrichmentProgress, EnrichmentError> {
        let state = {
            let _guard = self.locks.lock(candidate_id).await;
            if store::load::<CandidateRecord>(&*self.store, candidate_id).await?.is_none() {
                return Err(EnrichmentError::CandidateNotFound(candidate_id));
            }
            self.load_or_init(candidate_id).await?
        };
        if state.stage.is_terminal() {
            return Ok(state.progress());
        }

        let (generation, token) = {
            let mut tasks = self.registry();
            if tasks.contains_key(&candidate_id) {
                return Ok(state.progress());
            }
            let generation = self.generations.fetch_add(1, Ordering::Relaxed);
            let token = CancellationToken::new();
            tasks.insert(
                candidate_id,
                TaskEntry {
                    generation,
                    token: token.clone(),
                },
            );
            (generation, token)
        };

        let this = self.clone();
        tokio::spawn(async move {
            match this.run(candidate_id, token).await {
                Ok(state) => info!(%candidate_id, stage = %state.stage, "enrichment task finished"),
                Err(EnrichmentError::Cancelled(_)) => info!(%candidate_id, "enrichment task cancelled"),
                Err(e) => error!(%candidate_id, error = %e, "enrichment task aborted"),
            }
            // A cancelled task may outlive its entry; leave a newer task's alone.
            let mut tasks = this.registry();
            if tasks.get(&candidate_id).is_some_and(|e| e.generation == generation) {
                tasks.remove(&candidate_id);
            }
        });
        Ok(state.progress())
    }

    /// Signals the running task, if any, to stop at its next suspension point.
    pub fn cancel(&self, candidate_id: Uuid) -> bool {
        match self.registry().remove(&candidate_id) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Runs enrichment to a terminal stage. Resumes from whatever stage the
    /// stored record is in.
    pub async fn run(&self, candidate_id: Uuid, token: CancellationToken) -> Result<EnrichmentState, EnrichmentError> {
        let candidate = store::load::<CandidateRecord>(&*self.store, candidate_id)
            .await?
            .ok_or(EnrichmentError::CandidateNotFound(candidate_id))?;
        let job = resolve_job(&*self.jobs, candidate.job_id).await;

        loop {
            let (attempt, sources) = {
                let _guard = self.locks.lock(candidate_id).await;
                if token.is_cancelled() {
                    return Err(EnrichmentError::Cancelled(candidate_id));
                }
                let mut state = self.load_or_init(candidate_id).await?;
                match state.stage {
                    EnrichmentStage::Completed | EnrichmentStage::Failed => return Ok(state),
                    EnrichmentStage::Analyzing => {
                        drop(_guard);
                        return self.finish(&candidate, &job, &token, false).await;
                    }
                    EnrichmentStage::Pending if !state.attempts_remaining() => {
                        // Left pending at the ceiling; close it out without another fetch.
                        state.transition(EnrichmentStage::Fetching, Utc::now())?;
                        store::save(&*self.store, candidate_id, &state).await?;
                        let failed = !(state.has_any_payload() || candidate.expected_sources().is_empty());
                        warn!(%candidate_id, attempt = state.attempt_count, "no attempts left, finishing");
                        drop(_guard);
                        return self.finish(&candidate, &job, &token, failed).await;
                    }
                    EnrichmentStage::Pending => {
                        let attempt = state.begin_attempt(Utc::now())?;
                        store::save(&*self.store, candidate_id, &state).await?;
                        info!(%candidate_id, attempt, stage = %state.stage, "fetch attempt started");
                        (attempt, state.outstanding_sources(&candidate))
                    }
                    EnrichmentStage::Fetching => (state.attempt_count, state.outstanding_sources(&candidate)),
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(EnrichmentError::Cancelled(candidate_id)),
                outcome = self.fetch_sources(&candidate, &sources) => outcome,
            };

            match self.record_attempt(&candidate, attempt, outcome, &token).await? {
                Next::Retry(delay) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(EnrichmentError::Cancelled(candidate_id)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Next::Analyze => return self.finish(&candidate, &job, &token, false).await,
                Next::Fail => return self.finish(&candidate, &job, &token, true).await,
            }
        }
    }

    async fn fetch_sources(&self, candidate: &CandidateRecord, sources: &[DataSource]) -> FetchOutcome {
        // Held for the fetch only, never across a backoff sleep.
        let _permit = self.permits.acquire().await.ok();

        let wants = |s: DataSource| sources.contains(&s).then(|| candidate.profile_url(s)).flatten();
        let professional = async {
            match wants(DataSource::ProfessionalNetwork) {
                Some(url) => Some(self.professional.fetch(url).await),
                None => None,
            }
        };
        let code_hosting = async {
            match wants(DataSource::CodeHosting) {
                Some(url) => Some(self.code_hosting.fetch(url).await),
                None => None,
            }
        };
        let (professional, code_hosting) = tokio::join!(professional, code_hosting);
        FetchOutcome {
            professional,
            code_hosting,
        }
    }

    async fn record_attempt(
        &self,
        candidate: &CandidateRecord,
        attempt: u32,
        outcome: FetchOutcome,
        token: &CancellationToken,
    ) -> Result<Next, EnrichmentError> {
        let candidate_id = candidate.id;
        let _guard = self.locks.lock(candidate_id).await;
        if token.is_cancelled() {
            return Err(EnrichmentError::Cancelled(candidate_id));
        }
        let mut state = self.load_or_init(candidate_id).await?;
        let now = Utc::now();

        let mut errors = Vec::new();
        match outcome.professional {
            Some(Ok(profile)) => state.professional = Some(profile),
            Some(Err(e)) => {
                if e.is_permanent() {
                    state.abandoned_sources.insert(DataSource::ProfessionalNetwork);
                }
                errors.push(format!("{}: {e}", DataSource::ProfessionalNetwork));
            }
            None => {}
        }
        match outcome.code_hosting {
            Some(Ok(profile)) => state.code_hosting = Some(profile),
            Some(Err(e)) => {
                if e.is_permanent() {
                    state.abandoned_sources.insert(DataSource::CodeHosting);
                }
                errors.push(format!("{}: {e}", DataSource::CodeHosting));
            }
            None => {}
        }
        if !errors.is_empty() {
            state.last_error = Some(errors.join("; "));
        }

        let outstanding = state.outstanding_sources(candidate);
        let next = if outstanding.is_empty() {
            if state.has_any_payload() || candidate.expected_sources().is_empty() {
                Next::Analyze
            } else {
                Next::Fail
            }
        } else if state.attempts_remaining() {
            let delay = self.config.delay_before(attempt + 1);
            state.transition(EnrichmentStage::Pending, now)?;
            state.next_attempt_at = chrono::Duration::from_std(delay).ok().map(|d| now + d);
            warn!(
                %candidate_id,
                attempt,
                stage = %state.stage,
                delay_secs = delay.as_secs(),
                error = state.last_error.as_deref().unwrap_or_default(),
                "fetch attempt failed, retrying"
            );
            Next::Retry(delay)
        } else if state.has_any_payload() {
            warn!(%candidate_id, attempt, "retries exhausted, continuing with partial data");
            Next::Analyze
        } else {
            warn!(%candidate_id, attempt, "retries exhausted without third-party data");
            Next::Fail
        };

        state.updated_at = now;
        store::save(&*self.store, candidate_id, &state).await?;
        Ok(next)
    }

    /// Runs the analyzer and stores the assessment before the terminal stage,
    /// so a terminal stage always has an assessment behind it.
    async fn finish(
        &self,
        candidate: &CandidateRecord,
        job: &JobRequirement,
        token: &CancellationToken,
        failed: bool,
    ) -> Result<EnrichmentState, EnrichmentError> {
        let candidate_id = candidate.id;
        let _guard = self.locks.lock(candidate_id).await;
        if token.is_cancelled() {
            return Err(EnrichmentError::Cancelled(candidate_id));
        }
        let mut state = self.load_or_init(candidate_id).await?;
        let now = Utc::now();

        if !failed && state.stage != EnrichmentStage::Analyzing {
            state.transition(EnrichmentStage::Analyzing, now)?;
            store::save(&*self.store, candidate_id, &state).await?;
            info!(%candidate_id, stage = %state.stage, "analyzing profile");
        }

        let assessment = self.analyzer.analyze(AnalysisInput {
            candidate,
            job,
            professional: state.professional.as_ref(),
            code_hosting: state.code_hosting.as_ref(),
            as_of: now.date_naive(),
        });
        store::save(&*self.store, candidate_id, &assessment).await?;

        let terminal = if failed {
            EnrichmentStage::Failed
        } else {
            EnrichmentStage::Completed
        };
        state.transition(terminal, now)?;
        state.next_attempt_at = None;
        store::save(&*self.store, candidate_id, &state).await?;
        info!(
            %candidate_id,
            stage = %state.stage,
            attempt = state.attempt_count,
            degraded = assessment.degraded,
            "enrichment finished"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyzerConfig, ProfileAnalyzer, ProfileAssessment, RoleFitWeights};
    use crate::models::candidate::sample_candidate;
    use crate::signals::{SignalConfig, SignalExtractor};
    use crate::store::MemoryRecordStore;
    use crate::enrichment::fetchers::scripted::ScriptedFetcher;
    use crate::upstream::NoJobSource;
    use tokio::time::Instant;

    fn down() -> FetchError {
        FetchError::Status { status: 503 }
    }

    fn code_profile() -> CodeHostingProfile {
        CodeHostingProfile {
            username: "asha".into(),
            public_repos: 4,
            ..CodeHostingProfile::default()
        }
    }

    fn linked_candidate() -> CandidateRecord {
        let mut c = sample_candidate();
        c.resume_text = "Senior engineer with 7 years of experience in Rust and Python.".into();
        c.professional_profile_url = Some("https://www.linkedin.com/in/asha".into());
        c.code_hosting_url = Some("https://github.com/asha".into());
        c
    }

    struct Harness {
        store: Arc<MemoryRecordStore>,
        orchestrator: EnrichmentOrchestrator,
        professional: Arc<ScriptedFetcher<ProfessionalProfile>>,
        code: Arc<ScriptedFetcher<CodeHostingProfile>>,
    }

    async fn harness(
        candidate: &CandidateRecord,
        professional: Vec<Result<ProfessionalProfile, FetchError>>,
        code: Vec<Result<CodeHostingProfile, FetchError>>,
    ) -> Harness {
        let store = Arc::new(MemoryRecordStore::new());
        store::save(&*store, candidate.id, candidate).await.unwrap();
        let professional = ScriptedFetcher::new(DataSource::ProfessionalNetwork, professional);
        let code = ScriptedFetcher::new(DataSource::CodeHosting, code);
        let analyzer = ProfileAnalyzer::new(
            AnalyzerConfig::default(),
            RoleFitWeights::default(),
            SignalExtractor::new(&SignalConfig::default()),
        );
        let orchestrator = EnrichmentOrchestrator::new(
            EnrichmentConfig::default(),
            store.clone(),
            CandidateLocks::new(),
            Arc::new(NoJobSource),
            Arc::new(analyzer),
            professional.clone(),
            code.clone(),
        );
        Harness {
            store,
            orchestrator,
            professional,
            code,
        }
    }

    async fn assessment(store: &MemoryRecordStore, id: Uuid) -> Option<ProfileAssessment> {
        store::load(store, id).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_sources_succeed_first_attempt() {
        let c = linked_candidate();
        let h = harness(&c, vec![Ok(ProfessionalProfile::default())], vec![Ok(code_profile())]).await;

        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();

        assert_eq!(state.stage, EnrichmentStage::Completed);
        assert_eq!(state.attempt_count, 1);
        let a = assessment(&h.store, c.id).await.unwrap();
        assert!(!a.degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_end_failed_with_degraded_assessment() {
        let c = linked_candidate();
        let h = harness(&c, vec![Err(down()), Err(down()), Err(down())], vec![]).await;
        let started = Instant::now();

        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();

        assert_eq!(state.stage, EnrichmentStage::Failed);
        assert_eq!(state.attempt_count, 3);
        assert!(state.last_error.is_some());
        assert!(started.elapsed() >= Duration::from_secs(12));
        assert_eq!(h.professional.calls.load(Ordering::SeqCst), 3);
        let a = assessment(&h.store, c.id).await.unwrap();
        assert!(a.degraded);
        assert_eq!(a.missing_sources.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_payload_is_kept_across_retries() {
        let c = linked_candidate();
        let h = harness(
            &c,
            vec![Ok(ProfessionalProfile::default())],
            vec![Err(down()), Ok(code_profile())],
        )
        .await;

        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();

        assert_eq!(state.stage, EnrichmentStage::Completed);
        assert_eq!(state.attempt_count, 2);
        assert_eq!(h.professional.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.code.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let c = linked_candidate();
        let h = harness(
            &c,
            vec![Err(FetchError::NotFound("asha".into()))],
            vec![Ok(code_profile())],
        )
        .await;

        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();

        assert_eq!(state.stage, EnrichmentStage::Completed);
        assert_eq!(state.attempt_count, 1);
        assert!(state.abandoned_sources.contains(&DataSource::ProfessionalNetwork));
        let a = assessment(&h.store, c.id).await.unwrap();
        assert!(a.degraded);
        assert_eq!(a.missing_sources, vec![DataSource::ProfessionalNetwork]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_with_partial_data_completes_degraded() {
        let c = linked_candidate();
        let h = harness(&c, vec![Ok(ProfessionalProfile::default())], vec![]).await;

        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();

        assert_eq!(state.stage, EnrichmentStage::Completed);
        assert_eq!(state.attempt_count, 3);
        assert!(assessment(&h.store, c.id).await.unwrap().degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_links_completes_without_fetching() {
        let c = sample_candidate();
        let h = harness(&c, vec![], vec![]).await;

        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();

        assert_eq!(state.stage, EnrichmentStage::Completed);
        assert_eq!(h.professional.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.code.calls.load(Ordering::SeqCst), 0);
        assert!(assessment(&h.store, c.id).await.unwrap().degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_skips_analysis() {
        let c = linked_candidate();
        let h = harness(&c, vec![], vec![]).await;
        let token = CancellationToken::new();
        let id = c.id;
        let run = {
            let orchestrator = h.orchestrator.clone();
            let token = token.clone();
            tokio::spawn(async move { orchestrator.run(id, token).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let result = run.await.unwrap();
        assert!(matches!(result, Err(EnrichmentError::Cancelled(_))));
        assert!(assessment(&h.store, c.id).await.is_none());
        let state: EnrichmentState = store::load(&*h.store, c.id).await.unwrap().unwrap();
        assert_eq!(state.stage, EnrichmentStage::Pending);
        assert_eq!(state.attempt_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_terminal_is_not_restarted() {
        let c = linked_candidate();
        let h = harness(&c, vec![Ok(ProfessionalProfile::default())], vec![Ok(code_profile())]).await;

        h.orchestrator.start(c.id).await.unwrap();
        h.orchestrator.start(c.id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let progress = h.orchestrator.status(c.id).await.unwrap().unwrap();
        assert_eq!(progress.stage, EnrichmentStage::Completed);
        assert_eq!(progress.percentage, 100);
        assert!(!h.orchestrator.is_running(c.id));

        let again = h.orchestrator.start(c.id).await.unwrap();
        assert_eq!(again.stage, EnrichmentStage::Completed);
        assert_eq!(h.professional.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_leaves_restarted_task_registered() {
        let c = linked_candidate();
        let h = harness(&c, vec![], vec![]).await;

        h.orchestrator.start(c.id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.orchestrator.cancel(c.id));
        h.orchestrator.start(c.id).await.unwrap();

        // The cancelled task has exited by now; the restarted one is still in backoff.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.orchestrator.is_running(c.id));
        assert!(h.orchestrator.cancel(c.id));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!h.orchestrator.is_running(c.id));
        assert!(assessment(&h.store, c.id).await.is_none());
        let state: EnrichmentState = store::load(&*h.store, c.id).await.unwrap().unwrap();
        assert_eq!(state.stage, EnrichmentStage::Pending);
        assert_eq!(state.attempt_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_at_attempt_ceiling_still_reaches_terminal() {
        let c = linked_candidate();

        let h = harness(&c, vec![], vec![]).await;
        let mut stranded = EnrichmentState::new(c.id, 3, Utc::now());
        stranded.attempt_count = 3;
        store::save(&*h.store, c.id, &stranded).await.unwrap();
        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();
        assert_eq!(state.stage, EnrichmentStage::Failed);
        assert_eq!(state.attempt_count, 3);
        assert_eq!(h.professional.calls.load(Ordering::SeqCst), 0);
        assert!(assessment(&h.store, c.id).await.unwrap().degraded);

        let h = harness(&c, vec![], vec![]).await;
        stranded.code_hosting = Some(code_profile());
        store::save(&*h.store, c.id, &stranded).await.unwrap();
        let state = h.orchestrator.run(c.id, CancellationToken::new()).await.unwrap();
        assert_eq!(state.stage, EnrichmentStage::Completed);
        assert_eq!(h.code.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_unknown_candidate() {
        let c = sample_candidate();
        let h = harness(&c, vec![], vec![]).await;
        let result = h.orchestrator.start(Uuid::new_v4()).await;
        assert!(matches!(result, Err(EnrichmentError::CandidateNotFound(_))));
    }
}
