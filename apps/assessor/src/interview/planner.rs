//! Interview state machine.
//!
//! `not_started → planned → in_progress → completed`. The planner is
//! synchronous and owns no state: callers load a plan, call into the planner
//! under the candidate's lock, and persist the result. Any error leaves the
//! plan unmodified.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{FocusArea, ProfileAssessment};
use crate::enrichment::EnrichmentStage;
use crate::interview::plan::{
    allocate, mark_integrity_slot, sequence, CategoryAllocation, InterviewPlan, InterviewStatus,
    PlanContext, PlanMode, PlannedSlot, SlotKind,
};
use crate::interview::questions::question_for;
use crate::interview::{
    InterviewConfig, InterviewError, InterviewTurn, QuestionCategory, EVASIVE_ANSWER,
    INTEGRITY_CHECK_FAILED, VAGUE_ANSWER,
};
use crate::models::{JobRequirement, SeniorityLevel};
use crate::signals::{SignalBundle, SignalContext, SignalExtractor};

/// Phrases that mean "I don't know this", which is the honest answer to the
/// integrity probe.
const DISCLAIMERS: &[&str] = &[
    "not familiar",
    "haven't used",
    "have not used",
    "never used",
    "never heard",
    "don't know",
    "do not know",
    "not aware",
    "not sure what",
    "doesn't exist",
    "does not exist",
    "no experience with",
];

pub struct PlanRequest<'a> {
    pub candidate_id: Uuid,
    pub enrichment_stage: EnrichmentStage,
    pub assessment: Option<&'a ProfileAssessment>,
    pub job: &'a JobRequirement,
    pub force: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionPrompt {
    pub slot_index: usize,
    pub category: QuestionCategory,
    pub focus: String,
    pub kind: SlotKind,
    pub text: String,
    pub total_questions: usize,
    pub answered: usize,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub turn: InterviewTurn,
    pub follow_up_inserted: bool,
    pub completed: bool,
}

pub struct InterviewPlanner {
    config: InterviewConfig,
    signals: SignalExtractor,
    low_completeness_threshold: f64,
}

impl InterviewPlanner {
    pub fn new(config: InterviewConfig, signals: SignalExtractor, low_completeness_threshold: f64) -> Self {
        Self {
            config,
            signals,
            low_completeness_threshold,
        }
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    /// `not_started → planned`. Requires a terminal enrichment stage unless
    /// `force` is set, in which case a non-terminal stage yields the fixed
    /// generic plan.
    pub fn plan(&self, req: PlanRequest<'_>) -> Result<InterviewPlan, InterviewError> {
        let assessment = match (req.enrichment_stage.is_terminal(), req.assessment) {
            (true, Some(a)) => Some(a),
            (true, None) => {
                return Err(InterviewError::InvariantViolation(format!(
                    "enrichment is {} but no assessment exists",
                    req.enrichment_stage
                )))
            }
            (false, _) if req.force => None,
            (false, _) => {
                return Err(InterviewError::PreconditionFailed(format!(
                    "enrichment is still {}; wait for it to finish or force a generic plan",
                    req.enrichment_stage
                )))
            }
        };

        let plan = match assessment {
            Some(a) => self.adaptive_plan(req.candidate_id, a, req.job, req.now)?,
            None => self.generic_plan(req.candidate_id, req.job, req.now)?,
        };
        plan.check_invariants()?;
        info!(
            candidate_id = %plan.candidate_id,
            total = plan.total_questions,
            mode = ?plan.mode,
            "interview planned"
        );
        Ok(plan)
    }

    fn base_weights(&self) -> [f64; 5] {
        QuestionCategory::ALL.map(|c| self.config.categories.get(c).weight)
    }

    fn adaptive_plan(
        &self,
        candidate_id: Uuid,
        assessment: &ProfileAssessment,
        job: &JobRequirement,
        now: DateTime<Utc>,
    ) -> Result<InterviewPlan, InterviewError> {
        let cfg = &self.config;
        let uncertainty = assessment.red_flags.len()
            + assessment.low_confidence_indicators(self.low_completeness_threshold);
        let total = (cfg.min_questions + uncertainty * cfg.questions_per_signal)
            .clamp(cfg.min_questions, cfg.max_questions);

        let mut weights = self.base_weights();
        if !assessment.red_flags.is_empty() {
            weights[QuestionCategory::ExperienceValidation.index()] *= 1.5;
        }
        if assessment.skill_match.declared.len() > 5 {
            weights[QuestionCategory::TechnicalDepth.index()] *= 1.2;
        }
        let counts = allocate(cfg, total, &weights)?;

        let technical = {
            let mut areas = Vec::new();
            if !job.mandatory_skills.is_empty() {
                areas.push("mandatory_skill_validation");
            }
            areas.push("core_skills");
            if assessment.experience.level >= SeniorityLevel::Senior {
                areas.push("architecture_design");
            }
            areas
        };
        let experience = {
            let mut areas = Vec::new();
            if !assessment.red_flags.is_empty() {
                areas.push("discrepancy_probe");
            }
            areas.push("project_examples");
            if assessment.focus_areas.contains(&FocusArea::LeadershipValidation) {
                areas.push("leadership_examples");
            }
            if assessment.resume_signals.quantification > 0.3 {
                areas.push("scale_validation");
            }
            areas
        };

        let mut slots = sequence(&counts, |category, i| {
            let areas: &[&str] = match category {
                QuestionCategory::TechnicalDepth => &technical,
                QuestionCategory::ExperienceValidation => &experience,
                QuestionCategory::MotivationAlignment => &["company_interest", "career_goals"],
                QuestionCategory::BehavioralAssessment => &["problem_solving", "communication_style"],
                QuestionCategory::CultureFit => &["values_alignment", "team_collaboration"],
            };
            areas[i % areas.len()].to_string()
        });
        if cfg.include_integrity_check {
            mark_integrity_slot(&mut slots);
        }

        let skills = &assessment.skill_match;
        let mut probe_skills: Vec<String> = skills.mandatory.hits.iter().cloned().collect();
        probe_skills.extend(skills.corroborated.iter().filter(|s| !skills.mandatory.hits.contains(*s)).cloned());
        let rest: Vec<String> = skills
            .declared
            .iter()
            .filter(|s| !probe_skills.contains(*s))
            .cloned()
            .collect();
        probe_skills.extend(rest);

        let context = PlanContext {
            role: job.title.clone(),
            company: job.company_name.clone(),
            probe_skills,
            missing_skills: skills.mandatory.missing.iter().cloned().collect(),
            red_flags: assessment.red_flags.clone(),
        };

        Ok(self.assemble(candidate_id, PlanMode::Adaptive, false, total, counts, slots, context, now))
    }

    fn generic_plan(
        &self,
        candidate_id: Uuid,
        job: &JobRequirement,
        now: DateTime<Utc>,
    ) -> Result<InterviewPlan, InterviewError> {
        let total = self.config.min_questions;
        let counts = allocate(&self.config, total, &self.base_weights())?;
        let mut slots = sequence(&counts, |category, _| {
            let focus = match category {
                QuestionCategory::TechnicalDepth => "core_skills",
                QuestionCategory::ExperienceValidation => "project_examples",
                QuestionCategory::MotivationAlignment => "career_goals",
                QuestionCategory::BehavioralAssessment => "problem_solving",
                QuestionCategory::CultureFit => "team_collaboration",
            };
            focus.to_string()
        });
        if self.config.include_integrity_check {
            mark_integrity_slot(&mut slots);
        }
        let context = PlanContext {
            role: job.title.clone(),
            company: job.company_name.clone(),
            ..PlanContext::default()
        };
        Ok(self.assemble(candidate_id, PlanMode::Generic, true, total, counts, slots, context, now))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        candidate_id: Uuid,
        mode: PlanMode,
        forced: bool,
        total: usize,
        counts: [usize; 5],
        slots: Vec<PlannedSlot>,
        context: PlanContext,
        now: DateTime<Utc>,
    ) -> InterviewPlan {
        let allocations = QuestionCategory::ALL
            .iter()
            .map(|c| {
                let b = self.config.categories.get(*c);
                CategoryAllocation {
                    category: *c,
                    target: counts[c.index()],
                    min: b.min,
                    max: b.max,
                    asked: 0,
                }
            })
            .collect();
        InterviewPlan {
            candidate_id,
            status: InterviewStatus::Planned,
            mode,
            forced,
            total_questions: total,
            min_questions: self.config.min_questions,
            max_questions: self.config.max_questions,
            allocations,
            slots,
            cursor: 0,
            context,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Emits the question at the cursor. `planned → in_progress` on the first
    /// call. Asking again before an answer returns the same question.
    pub fn next_question(
        &self,
        plan: &mut InterviewPlan,
        now: DateTime<Utc>,
    ) -> Result<Option<QuestionPrompt>, InterviewError> {
        plan.check_invariants()?;
        match plan.status {
            InterviewStatus::Completed => return Ok(None),
            InterviewStatus::NotStarted => {
                return Err(InterviewError::PreconditionFailed("interview has not been planned".into()))
            }
            InterviewStatus::Planned | InterviewStatus::InProgress => {}
        }

        let cursor = plan.cursor;
        let Some(slot) = plan.slots.get(cursor) else {
            return Err(InterviewError::InvariantViolation(format!(
                "plan is {:?} with no slot at cursor {cursor}",
                plan.status
            )));
        };

        let text = match &slot.question {
            Some(text) => text.clone(),
            None => {
                let ordinal = plan.slots[..cursor]
                    .iter()
                    .filter(|s| s.category == slot.category && s.focus == slot.focus)
                    .count();
                question_for(slot, &plan.context, ordinal)
            }
        };

        if plan.status == InterviewStatus::Planned {
            plan.status = InterviewStatus::InProgress;
            info!(candidate_id = %plan.candidate_id, "interview started");
        }
        let slot = &mut plan.slots[cursor];
        slot.question = Some(text.clone());
        plan.updated_at = now;

        Ok(Some(self.prompt(plan, cursor)))
    }

    /// The outstanding question, if one has been emitted.
    pub fn current_question(&self, plan: &InterviewPlan) -> Option<QuestionPrompt> {
        plan.slots
            .get(plan.cursor)
            .filter(|s| s.question.is_some() && !s.answered)
            .map(|_| self.prompt(plan, plan.cursor))
    }

    fn prompt(&self, plan: &InterviewPlan, index: usize) -> QuestionPrompt {
        let slot = &plan.slots[index];
        QuestionPrompt {
            slot_index: index,
            category: slot.category,
            focus: slot.focus.clone(),
            kind: slot.kind,
            text: slot.question.clone().unwrap_or_default(),
            total_questions: plan.total_questions,
            answered: plan.answered_count(),
        }
    }

    /// Records an answer to the outstanding question, possibly inserts one
    /// follow-up in the same category, and advances the cursor.
    pub fn submit_answer(
        &self,
        plan: &mut InterviewPlan,
        answer: &str,
        turn_index: usize,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, InterviewError> {
        plan.check_invariants()?;
        if plan.status != InterviewStatus::InProgress {
            return Err(InterviewError::PreconditionFailed(format!(
                "cannot answer while the interview is {:?}",
                plan.status
            )));
        }
        let cursor = plan.cursor;
        let slot = plan
            .slots
            .get(cursor)
            .ok_or_else(|| InterviewError::InvariantViolation(format!("no slot at cursor {cursor}")))?;
        let Some(question) = slot.question.clone() else {
            return Err(InterviewError::PreconditionFailed("no question is outstanding".into()));
        };
        if answer.trim().is_empty() {
            return Err(InterviewError::InvalidAnswer("answer text is empty".into()));
        }

        let signals = self.signals.extract(answer, SignalContext::InterviewAnswer);
        let flags = self.answer_flags(slot.kind, answer, &signals);
        let category = slot.category;
        let kind = slot.kind;
        debug!(
            candidate_id = %plan.candidate_id,
            %category,
            words = signals.word_count,
            technical_density = signals.technical_density,
            vagueness = signals.vagueness,
            flags = ?flags,
            "answer signals"
        );

        let turn = InterviewTurn {
            candidate_id: plan.candidate_id,
            turn_index,
            slot_index: cursor,
            category,
            kind,
            question,
            answer: answer.to_string(),
            signals,
            flags_raised: flags.clone(),
            answered_at: now,
        };

        // Mutations start here; nothing below can fail except the final
        // invariant check.
        let mut next = plan.clone();
        next.slots[cursor].answered = true;
        if let Some(a) = next.allocation_mut(category) {
            a.asked += 1;
        }
        next.cursor += 1;

        let trigger = flags
            .iter()
            .find(|f| f.as_str() == VAGUE_ANSWER || f.as_str() == EVASIVE_ANSWER)
            .cloned();
        let mut follow_up_inserted = false;
        if let Some(trigger) = trigger.filter(|_| kind == SlotKind::Planned) {
            let room_in_category = next
                .allocation(category)
                .is_some_and(|a| a.target < a.max);
            if room_in_category && next.total_questions < next.max_questions {
                next.slots.insert(next.cursor, PlannedSlot::follow_up(category, &trigger));
                if let Some(a) = next.allocation_mut(category) {
                    a.target += 1;
                }
                next.total_questions += 1;
                follow_up_inserted = true;
                info!(candidate_id = %next.candidate_id, %category, %trigger, "follow-up inserted");
            }
        }

        let exhausted = next.cursor >= next.slots.len();
        let at_ceiling = next.answered_count() >= next.max_questions;
        let completed = exhausted || at_ceiling;
        if completed {
            if let Some(short) = next.allocations.iter().find(|a| a.asked < a.min) {
                return Err(InterviewError::InvariantViolation(format!(
                    "{} asked {} below minimum {} at completion",
                    short.category, short.asked, short.min
                )));
            }
            next.status = InterviewStatus::Completed;
            next.completed_at = Some(now);
            info!(candidate_id = %next.candidate_id, answered = next.answered_count(), "interview completed");
        }
        next.updated_at = now;
        next.check_invariants()?;

        *plan = next;
        Ok(AnswerOutcome {
            turn,
            follow_up_inserted,
            completed,
        })
    }

    fn answer_flags(&self, kind: SlotKind, answer: &str, signals: &SignalBundle) -> Vec<String> {
        let cfg = &self.config;
        let mut flags = Vec::new();
        if kind == SlotKind::IntegrityCheck {
            let lower = answer.to_lowercase();
            let disclaims = DISCLAIMERS.iter().any(|d| lower.contains(d));
            if !disclaims
                && signals.word_count >= cfg.integrity_detail_words
                && signals.vagueness < cfg.vague_answer_threshold
            {
                flags.push(INTEGRITY_CHECK_FAILED.to_string());
            }
            return flags;
        }
        if signals.word_count < cfg.evasive_answer_words {
            flags.push(EVASIVE_ANSWER.to_string());
        } else if signals.vagueness >= cfg.vague_answer_threshold {
            flags.push(VAGUE_ANSWER.to_string());
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisInput, AnalyzerConfig, ProfileAnalyzer, RoleFitWeights};
    use crate::models::candidate::sample_candidate;
    use crate::signals::SignalConfig;
    use chrono::NaiveDate;

    const GOOD_ANSWER: &str = "I rebuilt our billing pipeline in Rust because the Python \
        version could not keep up. First I profiled it, then moved the hot path to a queue, \
        and throughput went up 4 times within two months.";
    const VAGUE: &str = "I think maybe we did some stuff with things, probably kind of like \
        basically whatever the team wanted at that point.";

    fn planner() -> InterviewPlanner {
        InterviewPlanner::new(
            InterviewConfig::default(),
            SignalExtractor::new(&SignalConfig::default()),
            0.5,
        )
    }

    fn assessment(resume: &str) -> ProfileAssessment {
        let mut c = sample_candidate();
        c.resume_text = resume.to_string();
        c.declared_skills = vec!["rust".into(), "sql".into(), "go".into()];
        c.intro = Some("I build backend systems".into());
        c.why_us = Some("Your product".into());
        let analyzer = ProfileAnalyzer::new(
            AnalyzerConfig::default(),
            RoleFitWeights::default(),
            SignalExtractor::new(&SignalConfig::default()),
        );
        let job = JobRequirement::generic();
        analyzer.analyze(AnalysisInput {
            candidate: &c,
            job: &job,
            professional: None,
            code_hosting: None,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
    }

    fn request<'a>(
        stage: EnrichmentStage,
        assessment: Option<&'a ProfileAssessment>,
        job: &'a JobRequirement,
        force: bool,
    ) -> PlanRequest<'a> {
        PlanRequest {
            candidate_id: Uuid::new_v4(),
            enrichment_stage: stage,
            assessment,
            job,
            force,
            now: Utc::now(),
        }
    }

    fn run_to_completion(p: &InterviewPlanner, plan: &mut InterviewPlan, answer: &str) -> Vec<InterviewTurn> {
        let mut turns = Vec::new();
        while p.next_question(plan, Utc::now()).unwrap().is_some() {
            let outcome = p.submit_answer(plan, answer, turns.len(), Utc::now()).unwrap();
            turns.push(outcome.turn);
            plan.check_invariants().unwrap();
            assert!(plan.total_questions <= plan.max_questions);
        }
        turns
    }

    #[test]
    fn test_refuses_to_plan_while_enrichment_in_flight() {
        let job = JobRequirement::generic();
        for stage in [EnrichmentStage::Pending, EnrichmentStage::Fetching, EnrichmentStage::Analyzing] {
            let err = planner().plan(request(stage, None, &job, false)).unwrap_err();
            assert!(matches!(err, InterviewError::PreconditionFailed(_)), "{stage}");
        }
    }

    #[test]
    fn test_forced_plan_is_generic_floor_plan() {
        let job = JobRequirement::generic();
        let plan = planner()
            .plan(request(EnrichmentStage::Fetching, None, &job, true))
            .unwrap();
        assert_eq!(plan.status, InterviewStatus::Planned);
        assert_eq!(plan.mode, PlanMode::Generic);
        assert!(plan.forced);
        assert_eq!(plan.total_questions, 8);
        assert_eq!(
            plan.slots.iter().filter(|s| s.kind == SlotKind::IntegrityCheck).count(),
            1
        );
    }

    #[test]
    fn test_confident_profile_gets_floor_and_uncertain_profile_gets_more() {
        let job = JobRequirement::generic();
        let confident = assessment(&"Senior Engineer with 8 years of experience. ".repeat(10));
        let plan = planner()
            .plan(request(EnrichmentStage::Completed, Some(&confident), &job, false))
            .unwrap();
        assert_eq!(plan.total_questions, 8);

        let uncertain = assessment("Hello");
        let plan = planner()
            .plan(request(EnrichmentStage::Failed, Some(&uncertain), &job, false))
            .unwrap();
        // Low-confidence experience plus a thin resume.
        assert!(plan.total_questions > 8);
        assert!(plan.total_questions <= 15);
        plan.check_invariants().unwrap();
    }

    #[test]
    fn test_first_emission_moves_to_in_progress() {
        let job = JobRequirement::generic();
        let a = assessment("Senior Engineer with 8 years of experience");
        let p = planner();
        let mut plan = p.plan(request(EnrichmentStage::Completed, Some(&a), &job, false)).unwrap();
        let q = p.next_question(&mut plan, Utc::now()).unwrap().unwrap();
        assert_eq!(plan.status, InterviewStatus::InProgress);
        assert_eq!(q.category, QuestionCategory::TechnicalDepth);
        // Asking again returns the same outstanding question.
        let again = p.next_question(&mut plan, Utc::now()).unwrap().unwrap();
        assert_eq!(q, again);
    }

    #[test]
    fn test_answer_before_question_is_rejected_without_mutation() {
        let job = JobRequirement::generic();
        let p = planner();
        let mut plan = p.plan(request(EnrichmentStage::Failed, Some(&assessment("x")), &job, false)).unwrap();
        let before = plan.clone();
        let err = p.submit_answer(&mut plan, GOOD_ANSWER, 0, Utc::now()).unwrap_err();
        assert!(matches!(err, InterviewError::PreconditionFailed(_)));
        assert_eq!(plan, before);
    }

    #[test]
    fn test_empty_answer_is_rejected_without_mutation() {
        let job = JobRequirement::generic();
        let p = planner();
        let mut plan = p.plan(request(EnrichmentStage::Failed, Some(&assessment("x")), &job, false)).unwrap();
        p.next_question(&mut plan, Utc::now()).unwrap();
        let before = plan.clone();
        let err = p.submit_answer(&mut plan, "   ", 0, Utc::now()).unwrap_err();
        assert!(matches!(err, InterviewError::InvalidAnswer(_)));
        assert_eq!(plan, before);
    }

    #[test]
    fn test_full_run_completes_with_all_minimums() {
        let job = JobRequirement::generic();
        let a = assessment(&"Senior Engineer with 8 years of experience. ".repeat(10));
        let p = planner();
        let mut plan = p.plan(request(EnrichmentStage::Completed, Some(&a), &job, false)).unwrap();
        let turns = run_to_completion(&p, &mut plan, GOOD_ANSWER);
        assert_eq!(plan.status, InterviewStatus::Completed);
        assert_eq!(turns.len(), plan.total_questions);
        for alloc in &plan.allocations {
            assert!(alloc.asked >= alloc.min, "{}", alloc.category);
            assert_eq!(alloc.asked, alloc.target);
        }
        assert!(p.next_question(&mut plan, Utc::now()).unwrap().is_none());
        let err = p.submit_answer(&mut plan, GOOD_ANSWER, turns.len(), Utc::now()).unwrap_err();
        assert!(matches!(err, InterviewError::PreconditionFailed(_)));
    }

    #[test]
    fn test_vague_answer_inserts_one_same_category_follow_up() {
        let job = JobRequirement::generic();
        let a = assessment(&"Senior Engineer with 8 years of experience. ".repeat(10));
        let p = planner();
        let mut plan = p.plan(request(EnrichmentStage::Completed, Some(&a), &job, false)).unwrap();
        let total_before = plan.total_questions;
        p.next_question(&mut plan, Utc::now()).unwrap();
        let outcome = p.submit_answer(&mut plan, VAGUE, 0, Utc::now()).unwrap();
        assert_eq!(outcome.turn.flags_raised, vec![VAGUE_ANSWER.to_string()]);
        assert!(outcome.follow_up_inserted);
        assert_eq!(plan.total_questions, total_before + 1);
        let next = &plan.slots[plan.cursor];
        assert_eq!(next.kind, SlotKind::FollowUp);
        assert_eq!(next.category, QuestionCategory::TechnicalDepth);

        // A vague answer to the follow-up does not chain another one.
        p.next_question(&mut plan, Utc::now()).unwrap();
        let outcome = p.submit_answer(&mut plan, VAGUE, 1, Utc::now()).unwrap();
        assert!(!outcome.follow_up_inserted);
        assert_eq!(plan.total_questions, total_before + 1);
    }

    #[test]
    fn test_follow_ups_never_exceed_ceiling() {
        let job = JobRequirement::generic();
        let p = planner();
        let a = assessment("x");
        let mut plan = p.plan(request(EnrichmentStage::Failed, Some(&a), &job, false)).unwrap();
        let turns = run_to_completion(&p, &mut plan, VAGUE);
        assert_eq!(plan.status, InterviewStatus::Completed);
        assert!(plan.total_questions <= 15);
        assert!(turns.len() <= 15);
    }

    #[test]
    fn test_integrity_probe_detects_confident_bluff() {
        let job = JobRequirement::generic();
        let p = planner();
        let a = assessment(&"Senior Engineer with 8 years of experience. ".repeat(10));
        let mut plan = p.plan(request(EnrichmentStage::Completed, Some(&a), &job, false)).unwrap();
        let bluff = "We tuned the Timed Graph Layer to scale on p99 latency and queue depth, \
            and we exported those metrics through Prometheus into the autoscaler every fifteen seconds.";
        let mut failed = false;
        let mut i = 0;
        while let Some(q) = p.next_question(&mut plan, Utc::now()).unwrap() {
            let text = if q.kind == SlotKind::IntegrityCheck { bluff } else { GOOD_ANSWER };
            let outcome = p.submit_answer(&mut plan, text, i, Utc::now()).unwrap();
            failed |= outcome.turn.failed_integrity_check();
            i += 1;
        }
        assert!(failed);
    }

    #[test]
    fn test_integrity_probe_accepts_honest_answer() {
        let p = planner();
        let signals = p.signals.extract(
            "I'm not familiar with that tool, but for Kubernetes autoscaling in general I would look at CPU and request latency.",
            SignalContext::InterviewAnswer,
        );
        let flags = p.answer_flags(SlotKind::IntegrityCheck, "I'm not familiar with that tool", &signals);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_rephrase_changes_text_only() {
        let job = JobRequirement::generic();
        let p = planner();
        let a = assessment(&"Senior Engineer with 8 years of experience. ".repeat(10));
        let mut plan = p.plan(request(EnrichmentStage::Completed, Some(&a), &job, false)).unwrap();
        p.next_question(&mut plan, Utc::now()).unwrap();
        let before = plan.clone();
        plan.rephrase_current("Reworded question?".to_string());
        assert_eq!(plan.slots[0].question.as_deref(), Some("Reworded question?"));
        assert_eq!(plan.total_questions, before.total_questions);
        assert_eq!(plan.allocations, before.allocations);
        assert_eq!(plan.cursor, before.cursor);
    }
}
