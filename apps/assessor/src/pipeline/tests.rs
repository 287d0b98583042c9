//! End-to-end runs of the pipeline over the in-memory store with scripted
//! third-party fetchers.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::*;
use crate::enrichment::fetchers::scripted::ScriptedFetcher;
use crate::enrichment::FetchError;
use crate::interview::{InterviewStatus, SlotKind};
use crate::llm_client::LlmError;
use crate::models::candidate::sample_candidate;
use crate::models::{CodeHostingProfile, DataSource, JobRequirement, ProfessionalProfile, SeniorityLevel};
use crate::scoring::ScoringMethod;
use crate::store::{JobScoreRow, MemoryRecordStore, RecordKind, StoreError};
use crate::upstream::{JobSourceError, NoJobSource};

type Script<P> = Vec<Result<P, FetchError>>;

pub(crate) struct StaticJobSource(pub JobRequirement);

#[async_trait]
impl JobSource for StaticJobSource {
    async fn job_requirement(&self, _job_id: i64) -> Result<Option<JobRequirement>, JobSourceError> {
        Ok(Some(self.0.clone()))
    }
}

fn service_on(
    store: Arc<dyn RecordStore>,
    jobs: Arc<dyn JobSource>,
    professional: Script<ProfessionalProfile>,
    code: Script<CodeHostingProfile>,
    phraser: Option<Arc<dyn QuestionPhraser>>,
) -> AssessmentService {
    let deps = PipelineDeps {
        store,
        jobs,
        professional: ScriptedFetcher::new(DataSource::ProfessionalNetwork, professional),
        code_hosting: ScriptedFetcher::new(DataSource::CodeHosting, code),
        reviewer: None,
        phraser,
    };
    AssessmentService::new(PipelineConfig::default(), deps)
}

pub(crate) fn service_with(
    jobs: Arc<dyn JobSource>,
    professional: Script<ProfessionalProfile>,
    code: Script<CodeHostingProfile>,
    phraser: Option<Arc<dyn QuestionPhraser>>,
) -> (Arc<MemoryRecordStore>, AssessmentService) {
    let store = Arc::new(MemoryRecordStore::new());
    let service = service_on(store.clone(), jobs, professional, code, phraser);
    (store, service)
}

pub(crate) fn memory_service(
    professional: Script<ProfessionalProfile>,
    code: Script<CodeHostingProfile>,
) -> (Arc<MemoryRecordStore>, AssessmentService) {
    service_with(Arc::new(NoJobSource), professional, code, None)
}

fn down<P>(times: usize) -> Script<P> {
    (0..times).map(|_| Err(FetchError::Status { status: 503 })).collect()
}

fn skills(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn senior_backend_job() -> JobRequirement {
    JobRequirement {
        job_id: Some(42),
        title: "Senior Backend Engineer".into(),
        mandatory_skills: skills(&["rust", "postgresql"]),
        preferred_skills: skills(&["kubernetes"]),
        seniority: SeniorityLevel::Senior,
        ..JobRequirement::generic()
    }
}

fn senior_candidate() -> CandidateRecord {
    let mut c = sample_candidate();
    c.resume_text = "Senior Backend Engineer with 8 years of experience building Rust and \
        PostgreSQL services. "
        .repeat(5);
    c.declared_skills = vec!["rust".into(), "postgresql".into(), "kubernetes".into()];
    c.intro = Some("I build reliable backend systems and enjoy mentoring.".into());
    c.why_us = Some("I want to grow with a team that cares about data quality.".into());
    c.professional_profile_url = Some("https://www.linkedin.com/in/asha-rai".into());
    c.code_hosting_url = Some("https://github.com/asharai".into());
    c
}

const GOOD_ANSWER: &str = "I rebuilt our billing pipeline in Rust because the Python \
    version could not keep up. First I profiled it, then moved the hot path to a queue, \
    and throughput went up 4 times within two months.";
const VAGUE_ANSWER: &str = "I think maybe we did some stuff with things, probably kind of like \
    basically whatever the team wanted at that point.";
const HONEST_ANSWER: &str = "I'm not familiar with that one, I have never used it.";

async fn wait_for_terminal(service: &AssessmentService, id: Uuid) -> EnrichmentProgress {
    for _ in 0..120 {
        let progress = service.get_enrichment_status(id).await.unwrap();
        if progress.stage.is_terminal() && !service.enrichment.is_running(id) {
            return progress;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("enrichment for {id} never reached a terminal stage");
}

/// Answers every question until the interview completes. The integrity
/// probe always gets an honest answer.
async fn run_interview(service: &AssessmentService, id: Uuid, first: Option<QuestionPrompt>, answer: &str) -> usize {
    let mut prompt = first;
    let mut follow_ups = 0;
    while let Some(q) = prompt {
        let text = if q.kind == SlotKind::IntegrityCheck {
            HONEST_ANSWER
        } else {
            answer
        };
        let receipt = service.submit_answer(id, text).await.unwrap();
        follow_ups += receipt.follow_up_inserted as usize;
        prompt = receipt.next_question;
    }
    follow_ups
}

#[tokio::test(start_paused = true)]
async fn test_degraded_senior_candidate_scores_through_fallback() {
    let (_, service) = service_with(
        Arc::new(StaticJobSource(senior_backend_job())),
        down(3),
        down(3),
        None,
    );
    let c = senior_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    service.start_enrichment(id).await.unwrap();

    let progress = wait_for_terminal(&service, id).await;
    assert_eq!(progress.stage, EnrichmentStage::Failed);
    assert_eq!(progress.attempt_count, 3);

    let assessment = service.get_assessment(id).await.unwrap();
    assert!(assessment.degraded);
    assert_eq!(assessment.skill_match.mandatory.ratio, Some(1.0));
    assert_eq!(assessment.experience.level, SeniorityLevel::Senior);

    let view = service.start_interview(id, false).await.unwrap();
    assert!(!view.plan.forced);
    assert!((8..=10).contains(&view.plan.total_questions), "{}", view.plan.total_questions);
    run_interview(&service, id, view.current_question, GOOD_ANSWER).await;
    assert_eq!(
        service.get_interview_plan(id).await.unwrap().plan.status,
        InterviewStatus::Completed
    );

    let score = service.compute_score(id, false).await.unwrap();
    assert_eq!(score.scoring_method, ScoringMethod::Fallback);
    assert!(score.subscores.data_confidence <= 0.7 + 1e-9);
    assert!((0.0..=1.0).contains(&score.fit_score));
    assert!(!score.integrity_check_failed);
}

#[tokio::test(start_paused = true)]
async fn test_two_of_three_mandatory_skills() {
    let job = JobRequirement {
        mandatory_skills: skills(&["rust", "go", "kafka"]),
        ..JobRequirement::generic()
    };
    let (_, service) = service_with(Arc::new(StaticJobSource(job)), vec![], vec![], None);
    let mut c = sample_candidate();
    c.declared_skills = vec!["rust".into(), "go".into()];
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    service.start_enrichment(id).await.unwrap();

    // No profile links means nothing to fetch.
    assert_eq!(wait_for_terminal(&service, id).await.stage, EnrichmentStage::Completed);
    let assessment = service.get_assessment(id).await.unwrap();
    assert_eq!(assessment.skill_match.mandatory.ratio, Some(2.0 / 3.0));
}

#[tokio::test(start_paused = true)]
async fn test_failed_enrichment_still_allows_planning() {
    let (store, service) = memory_service(down(3), down(3));
    let c = senior_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    service.start_enrichment(id).await.unwrap();

    assert_eq!(wait_for_terminal(&service, id).await.stage, EnrichmentStage::Failed);
    let assessment: ProfileAssessment = store::load(&*store, id).await.unwrap().unwrap();
    assert_eq!(
        assessment.missing_sources,
        vec![DataSource::ProfessionalNetwork, DataSource::CodeHosting]
    );

    let view = service.start_interview(id, false).await.unwrap();
    assert_eq!(view.plan.status, InterviewStatus::InProgress);
    assert!(view.current_question.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_vague_answers_never_push_past_ceiling() {
    let (_, service) = memory_service(vec![], vec![]);
    let mut c = sample_candidate();
    c.resume_text = "Hello".into();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    service.start_enrichment(id).await.unwrap();
    wait_for_terminal(&service, id).await;

    let view = service.start_interview(id, false).await.unwrap();
    let planned = view.plan.total_questions;
    let follow_ups = run_interview(&service, id, view.current_question, VAGUE_ANSWER).await;

    let view = service.get_interview_plan(id).await.unwrap();
    assert!(follow_ups >= 1);
    assert_eq!(view.plan.status, InterviewStatus::Completed);
    assert!(view.plan.total_questions <= 15);
    assert!(view.plan.total_questions <= planned + follow_ups);
    assert_eq!(view.turns_recorded, view.plan.total_questions);
    view.plan.check_invariants().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_interview_waits_for_enrichment_unless_forced() {
    let (_, service) = memory_service(vec![], vec![]);
    let c = senior_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();

    let err = service.start_interview(id, false).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(_)));
    assert!(matches!(
        service.get_interview_plan(id).await,
        Err(AppError::PreconditionFailed(_))
    ));

    let view = service.start_interview(id, true).await.unwrap();
    assert!(view.plan.forced);
    assert_eq!(view.plan.total_questions, 8);

    let again = service.start_interview(id, true).await.unwrap_err();
    assert!(matches!(again, AppError::PreconditionFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_empty_answer_records_nothing() {
    let (_, service) = memory_service(vec![], vec![]);
    let c = sample_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    let view = service.start_interview(id, true).await.unwrap();

    let err = service.submit_answer(id, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let after = service.get_interview_plan(id).await.unwrap();
    assert_eq!(after.turns_recorded, 0);
    assert_eq!(after.current_question, view.current_question);
}

#[tokio::test(start_paused = true)]
async fn test_scoring_an_unfinished_interview_needs_force() {
    let (_, service) = memory_service(vec![], vec![]);
    let c = senior_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    service.start_enrichment(id).await.unwrap();
    wait_for_terminal(&service, id).await;
    service.start_interview(id, false).await.unwrap();
    service.submit_answer(id, GOOD_ANSWER).await.unwrap();

    assert!(matches!(
        service.compute_score(id, false).await,
        Err(AppError::PreconditionFailed(_))
    ));
    let forced = service.compute_score(id, true).await.unwrap();
    assert!(forced.forced);

    // The stored score is returned as-is until a recompute.
    let stored = service.compute_score(id, false).await.unwrap();
    assert_eq!(stored, forced);
    let fresh = service.recompute_score(id, true).await.unwrap();
    assert_eq!(service.compute_score(id, false).await.unwrap(), fresh);
}

#[tokio::test(start_paused = true)]
async fn test_abandon_during_backoff_leaves_no_assessment() {
    let (store, service) = memory_service(vec![], down(3));
    let mut c = sample_candidate();
    c.code_hosting_url = Some("https://github.com/asharai".into());
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    service.start_enrichment(id).await.unwrap();

    // First attempt fails immediately, the retry waits 2s.
    tokio::time::sleep(Duration::from_secs(1)).await;
    service.abandon_candidate(id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(matches!(
        service.get_enrichment_status(id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(store::load::<ProfileAssessment>(&*store, id).await.unwrap().is_none());
    assert!(store::load::<CandidateRecord>(&*store, id).await.unwrap().is_some());
    assert!(!service.enrichment.is_running(id));
}

#[tokio::test(start_paused = true)]
async fn test_abandon_reaches_enrichment_restarted_after_abandon() {
    let (store, service) = memory_service(vec![], down(6));
    let mut c = sample_candidate();
    c.code_hosting_url = Some("https://github.com/asharai".into());
    let id = c.id;
    service.register_candidate(c).await.unwrap();

    service.start_enrichment(id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    service.abandon_candidate(id).await.unwrap();

    service.start_enrichment(id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(service.enrichment.is_running(id));

    service.abandon_candidate(id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(!service.enrichment.is_running(id));
    assert!(store::load::<ProfileAssessment>(&*store, id).await.unwrap().is_none());
    assert!(matches!(
        service.get_enrichment_status(id).await,
        Err(AppError::NotFound(_))
    ));
}

/// Memory store whose answer writes can be switched to fail.
#[derive(Default)]
struct FlakyAnswerStore {
    inner: MemoryRecordStore,
    fail_answers: AtomicBool,
}

#[async_trait]
impl RecordStore for FlakyAnswerStore {
    async fn get(&self, candidate_id: Uuid, kind: RecordKind) -> Result<Option<Value>, StoreError> {
        self.inner.get(candidate_id, kind).await
    }

    async fn put(&self, candidate_id: Uuid, kind: RecordKind, value: Value) -> Result<(), StoreError> {
        self.inner.put(candidate_id, kind, value).await
    }

    async fn record_answer(&self, turn: &InterviewTurn, plan: Value) -> Result<(), StoreError> {
        if self.fail_answers.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.record_answer(turn, plan).await
    }

    async fn list_turns(&self, candidate_id: Uuid) -> Result<Vec<InterviewTurn>, StoreError> {
        self.inner.list_turns(candidate_id).await
    }

    async fn delete_pipeline_records(&self, candidate_id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_pipeline_records(candidate_id).await
    }

    async fn list_scores_for_job(&self, job_id: i64) -> Result<Vec<JobScoreRow>, StoreError> {
        self.inner.list_scores_for_job(job_id).await
    }
}

#[tokio::test]
async fn test_failed_answer_write_leaves_no_orphan_turn() {
    let store = Arc::new(FlakyAnswerStore::default());
    let service = service_on(store.clone(), Arc::new(NoJobSource), vec![], vec![], None);
    let c = sample_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    let view = service.start_interview(id, true).await.unwrap();

    store.fail_answers.store(true, Ordering::SeqCst);
    let err = service.submit_answer(id, GOOD_ANSWER).await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));

    let after = service.get_interview_plan(id).await.unwrap();
    assert_eq!(after.turns_recorded, 0);
    assert_eq!(after.plan.cursor, view.plan.cursor);
    assert_eq!(after.current_question, view.current_question);

    // The same slot can be answered once the store recovers.
    store.fail_answers.store(false, Ordering::SeqCst);
    let receipt = service.submit_answer(id, GOOD_ANSWER).await.unwrap();
    assert_eq!(receipt.turn.turn_index, 0);
    assert_eq!(receipt.turn.slot_index, view.current_question.unwrap().slot_index);
    assert_eq!(service.get_interview_plan(id).await.unwrap().turns_recorded, 1);
}

#[tokio::test]
async fn test_register_twice_is_rejected() {
    let (_, service) = memory_service(vec![], vec![]);
    let c = sample_candidate();
    service.register_candidate(c.clone()).await.unwrap();
    assert!(matches!(
        service.register_candidate(c).await,
        Err(AppError::PreconditionFailed(_))
    ));
}

#[tokio::test]
async fn test_resume_upload_fills_links() {
    let (_, service) = memory_service(vec![], vec![]);
    let c = sample_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();

    let resume = b"Asha Rai - github.com/asharai\nRust and PostgreSQL engineer.";
    let report = service.ingest_resume(id, resume, Some("text/plain")).await.unwrap();
    assert_eq!(report.links_added, vec![DataSource::CodeHosting]);

    let unknown = service.ingest_resume(Uuid::new_v4(), resume, None).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}

struct FixedPhraser(Option<&'static str>);

#[async_trait]
impl QuestionPhraser for FixedPhraser {
    async fn rephrase(&self, _prompt: &QuestionPrompt, _role: &str) -> Result<String, LlmError> {
        self.0.map(str::to_string).ok_or(LlmError::EmptyContent)
    }
}

#[tokio::test]
async fn test_phrasing_only_changes_wording() {
    let reworded = "Walk me through the hardest system you have shipped?";
    let (_, service) = service_with(
        Arc::new(NoJobSource),
        vec![],
        vec![],
        Some(Arc::new(FixedPhraser(Some(reworded)))),
    );
    let c = sample_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    let view = service.start_interview(id, true).await.unwrap();
    let q = view.current_question.unwrap();

    let stored = service.get_interview_plan(id).await.unwrap();
    assert_eq!(stored.plan.total_questions, 8);
    if q.kind != SlotKind::IntegrityCheck {
        assert_eq!(q.text, reworded);
        assert_eq!(stored.current_question.unwrap().text, reworded);
    }
}

#[tokio::test]
async fn test_failed_phrasing_keeps_template() {
    let (_, service) = service_with(Arc::new(NoJobSource), vec![], vec![], Some(Arc::new(FixedPhraser(None))));
    let c = sample_candidate();
    let id = c.id;
    service.register_candidate(c).await.unwrap();
    let view = service.start_interview(id, true).await.unwrap();
    let stored = service.get_interview_plan(id).await.unwrap();
    assert_eq!(view.current_question, stored.current_question);
    assert!(!view.current_question.unwrap().text.is_empty());
}
