use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::ProfileAssessment;
use crate::interview::{InterviewPlan, InterviewTurn};
use crate::models::{CandidateRecord, JobRequirement};
use crate::scoring::review::ReviewRequest;
use crate::scoring::subscores::compute_subscores;
use crate::scoring::{CompositeScore, HolisticReview, HolisticReviewer, ScoringConfig, ScoringMethod, Subscores};

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("{0}")]
    PreconditionFailed(String),
}

pub struct ScoringInput<'a> {
    pub candidate: &'a CandidateRecord,
    pub job: &'a JobRequirement,
    pub assessment: &'a ProfileAssessment,
    pub plan: Option<&'a InterviewPlan>,
    pub turns: &'a [InterviewTurn],
    /// Score even though the interview has not completed.
    pub force: bool,
    pub now: DateTime<Utc>,
}

/// Result of the local computation, before any holistic review.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalScore {
    pub subscores: Subscores,
    pub weighted: f64,
    pub confidence_multiplier: f64,
    pub integrity_penalty: f64,
    pub integrity_check_failed: bool,
    pub red_flag_count: usize,
    pub forced: bool,
}

pub struct ScoringEngine {
    config: ScoringConfig,
    reviewer: Option<Arc<dyn HolisticReviewer>>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, reviewer: Option<Arc<dyn HolisticReviewer>>) -> Self {
        Self { config, reviewer }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Refuses to read an interview that is neither completed nor forced.
    fn gate(&self, input: &ScoringInput<'_>) -> Result<bool, ScoringError> {
        match input.plan {
            Some(plan) if plan.is_terminal() => Ok(false),
            _ if input.force => Ok(true),
            Some(plan) => Err(ScoringError::PreconditionFailed(format!(
                "interview is {:?}; finish it or force scoring",
                plan.status
            ))),
            None => Err(ScoringError::PreconditionFailed(
                "interview has not started; start it or force scoring".to_string(),
            )),
        }
    }

    /// The fully local weighted computation. Never suspends.
    pub fn score_local(&self, input: &ScoringInput<'_>) -> Result<LocalScore, ScoringError> {
        let forced = self.gate(input)?;
        let cfg = &self.config;

        let subscores = compute_subscores(cfg, input.candidate, input.assessment, input.plan, input.turns);
        let weighted = subscores.weighted(cfg);
        let confidence_multiplier = 0.5 + 0.5 * subscores.data_confidence;

        let red_flag_count = input.assessment.red_flags.len();
        let integrity_check_failed = input.turns.iter().any(|t| t.failed_integrity_check());
        let flag_multiplier =
            (1.0 - cfg.integrity_penalty_per_flag * red_flag_count as f64).max(cfg.min_flag_multiplier);
        let integrity_penalty = if integrity_check_failed {
            flag_multiplier * cfg.fraud_penalty
        } else {
            flag_multiplier
        };

        Ok(LocalScore {
            subscores,
            weighted,
            confidence_multiplier,
            integrity_penalty: integrity_penalty.clamp(0.0, 1.0),
            integrity_check_failed,
            red_flag_count,
            forced,
        })
    }

    /// Local score, blended with a holistic review when one is configured and
    /// comes back well-formed. Any review failure means `fallback`.
    pub async fn score(&self, input: &ScoringInput<'_>) -> Result<CompositeScore, ScoringError> {
        let local = self.score_local(input)?;
        let candidate_id = input.candidate.id;

        let review = match &self.reviewer {
            Some(reviewer) => {
                let request = ReviewRequest {
                    job: input.job,
                    assessment: input.assessment,
                    turns: input.turns,
                    subscores: &local.subscores,
                };
                match reviewer.review(&request).await {
                    Ok(review) => Some(review),
                    Err(e) => {
                        warn!(%candidate_id, error = %e, "holistic review unavailable, using fallback scoring");
                        None
                    }
                }
            }
            None => None,
        };

        let score = self.finalize(candidate_id, local, review, input.now);
        info!(
            %candidate_id,
            fit_score = score.fit_score,
            bucket = ?score.bucket,
            method = ?score.scoring_method,
            "candidate scored"
        );
        Ok(score)
    }

    fn finalize(
        &self,
        candidate_id: uuid::Uuid,
        local: LocalScore,
        review: Option<HolisticReview>,
        now: DateTime<Utc>,
    ) -> CompositeScore {
        let cfg = &self.config;
        let (raw_score, scoring_method) = match &review {
            Some(r) => (
                (1.0 - cfg.augmentation_weight) * local.weighted + cfg.augmentation_weight * r.fit_score,
                ScoringMethod::Primary,
            ),
            None => (local.weighted, ScoringMethod::Fallback),
        };
        let fit_score = raw_score * local.confidence_multiplier * local.integrity_penalty;
        let fit_score = if fit_score.is_finite() {
            fit_score.clamp(0.0, 1.0)
        } else {
            0.0
        };

        CompositeScore {
            candidate_id,
            fit_score,
            bucket: cfg.bucket(fit_score),
            subscores: local.subscores,
            raw_score: raw_score.clamp(0.0, 1.0),
            confidence_multiplier: local.confidence_multiplier,
            integrity_penalty: local.integrity_penalty,
            integrity_check_failed: local.integrity_check_failed,
            red_flag_count: local.red_flag_count,
            scoring_method,
            review,
            forced: local.forced,
            computed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisInput, AnalyzerConfig, ProfileAnalyzer, RoleFitWeights};
    use crate::enrichment::EnrichmentStage;
    use crate::interview::{
        InterviewConfig, InterviewPlanner, InterviewStatus, PlanRequest, QuestionCategory, SlotKind,
        INTEGRITY_CHECK_FAILED,
    };
    use crate::llm_client::LlmError;
    use crate::models::candidate::sample_candidate;
    use crate::scoring::FitBucket;
    use crate::signals::{SignalBundle, SignalConfig, SignalContext, SignalExtractor};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedReviewer(Option<HolisticReview>);

    #[async_trait]
    impl HolisticReviewer for FixedReviewer {
        async fn review(&self, _request: &ReviewRequest<'_>) -> Result<HolisticReview, LlmError> {
            self.0.clone().ok_or(LlmError::EmptyContent)
        }
    }

    struct Fixture {
        candidate: CandidateRecord,
        job: JobRequirement,
        assessment: ProfileAssessment,
        plan: InterviewPlan,
    }

    fn fixture() -> Fixture {
        let mut candidate = sample_candidate();
        candidate.resume_text = "Senior backend engineer, 8 years of experience with Rust, \
            Python and PostgreSQL. Led a team of 5 and cut costs by 30%."
            .into();
        candidate.declared_skills = vec!["rust".into(), "python".into(), "postgresql".into()];
        let job = JobRequirement::generic();
        let extractor = SignalExtractor::new(&SignalConfig::default());
        let analyzer = ProfileAnalyzer::new(AnalyzerConfig::default(), RoleFitWeights::default(), extractor.clone());
        let assessment = analyzer.analyze(AnalysisInput {
            candidate: &candidate,
            job: &job,
            professional: None,
            code_hosting: None,
            as_of: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        });
        let planner = InterviewPlanner::new(InterviewConfig::default(), extractor, 0.5);
        let plan = planner
            .plan(PlanRequest {
                candidate_id: candidate.id,
                enrichment_stage: EnrichmentStage::Failed,
                assessment: Some(&assessment),
                job: &job,
                force: false,
                now: Utc::now(),
            })
            .unwrap();
        Fixture {
            candidate,
            job,
            assessment,
            plan,
        }
    }

    fn input<'a>(f: &'a Fixture, plan: Option<&'a InterviewPlan>, turns: &'a [InterviewTurn], force: bool) -> ScoringInput<'a> {
        ScoringInput {
            candidate: &f.candidate,
            job: &f.job,
            assessment: &f.assessment,
            plan,
            turns,
            force,
            now: Utc::now(),
        }
    }

    fn completed(plan: &InterviewPlan) -> InterviewPlan {
        let mut p = plan.clone();
        p.status = InterviewStatus::Completed;
        p
    }

    #[tokio::test]
    async fn test_unfinished_interview_requires_force() {
        let f = fixture();
        let engine = ScoringEngine::new(ScoringConfig::default(), None);

        let err = engine.score(&input(&f, Some(&f.plan), &[], false)).await.unwrap_err();
        assert!(matches!(err, ScoringError::PreconditionFailed(_)));
        assert!(engine.score(&input(&f, None, &[], false)).await.is_err());

        let forced = engine.score(&input(&f, Some(&f.plan), &[], true)).await.unwrap();
        assert!(forced.forced);
    }

    #[tokio::test]
    async fn test_no_reviewer_and_failing_reviewer_fall_back() {
        let f = fixture();
        let plan = completed(&f.plan);
        let local = ScoringEngine::new(ScoringConfig::default(), None)
            .score(&input(&f, Some(&plan), &[], false))
            .await
            .unwrap();
        assert_eq!(local.scoring_method, ScoringMethod::Fallback);

        let failing = ScoringEngine::new(ScoringConfig::default(), Some(Arc::new(FixedReviewer(None))))
            .score(&input(&f, Some(&plan), &[], false))
            .await
            .unwrap();
        assert_eq!(failing.scoring_method, ScoringMethod::Fallback);
        assert_eq!(failing.fit_score, local.fit_score);
        assert!(failing.review.is_none());
    }

    #[tokio::test]
    async fn test_review_is_blended() {
        let f = fixture();
        let plan = completed(&f.plan);
        let review = HolisticReview {
            fit_score: 1.0,
            consistency_score: 0.9,
            insights: vec!["consistent story".into()],
            red_flags: vec![],
        };
        let engine = ScoringEngine::new(ScoringConfig::default(), Some(Arc::new(FixedReviewer(Some(review)))));
        let local = engine.score_local(&input(&f, Some(&plan), &[], false)).unwrap();
        let score = engine.score(&input(&f, Some(&plan), &[], false)).await.unwrap();

        assert_eq!(score.scoring_method, ScoringMethod::Primary);
        let expected_raw = 0.7 * local.weighted + 0.3;
        assert!((score.raw_score - expected_raw).abs() < 1e-12);
        let expected = expected_raw * local.confidence_multiplier * local.integrity_penalty;
        assert!((score.fit_score - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_failed_integrity_check_applies_fraud_penalty() {
        let f = fixture();
        let plan = completed(&f.plan);
        let turn = InterviewTurn {
            candidate_id: f.candidate.id,
            turn_index: 0,
            slot_index: 0,
            category: QuestionCategory::TechnicalDepth,
            kind: SlotKind::IntegrityCheck,
            question: "q".into(),
            answer: "a".into(),
            signals: SignalBundle::zero(SignalContext::InterviewAnswer),
            flags_raised: vec![INTEGRITY_CHECK_FAILED.to_string()],
            answered_at: Utc::now(),
        };
        let engine = ScoringEngine::new(ScoringConfig::default(), None);
        let clean = engine.score_local(&input(&f, Some(&plan), &[], false)).unwrap();
        let caught = engine
            .score_local(&input(&f, Some(&plan), std::slice::from_ref(&turn), false))
            .unwrap();
        assert!(caught.integrity_check_failed);
        assert!((caught.integrity_penalty - clean.integrity_penalty * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_fit_score_clamped_and_bucketed() {
        let f = fixture();
        let engine = ScoringEngine::new(ScoringConfig::default(), None);
        let local = LocalScore {
            subscores: Subscores {
                role_fit: 1.0,
                capability_depth: 1.0,
                motivation_alignment: 1.0,
                reliability: 1.0,
                data_confidence: 1.0,
            },
            weighted: 1.0,
            confidence_multiplier: 1.0,
            integrity_penalty: 1.0,
            integrity_check_failed: false,
            red_flag_count: 0,
            forced: false,
        };
        let review = HolisticReview {
            fit_score: 1.0,
            consistency_score: 1.0,
            insights: vec![],
            red_flags: vec![],
        };
        let score = engine.finalize(f.candidate.id, local.clone(), Some(review), Utc::now());
        assert_eq!(score.fit_score, 1.0);
        assert_eq!(score.bucket, FitBucket::Top);

        let nan = LocalScore {
            weighted: f64::NAN,
            ..local
        };
        let score = engine.finalize(f.candidate.id, nan, None, Utc::now());
        assert_eq!(score.fit_score, 0.0);
        assert_eq!(score.bucket, FitBucket::Low);
    }
}
