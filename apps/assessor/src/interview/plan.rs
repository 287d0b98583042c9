use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::RedFlag;
use crate::interview::{InterviewConfig, InterviewError, QuestionCategory};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    NotStarted,
    Planned,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Built from a ProfileAssessment.
    Adaptive,
    /// Fixed plan used when the caller forces a start before enrichment ends.
    Generic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Planned,
    FollowUp,
    IntegrityCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedSlot {
    pub category: QuestionCategory,
    pub focus: String,
    pub kind: SlotKind,
    /// Set when the question is emitted.
    pub question: Option<String>,
    pub answered: bool,
    /// Answer flag that caused a follow-up slot.
    #[serde(default)]
    pub trigger: Option<String>,
}

impl PlannedSlot {
    fn new(category: QuestionCategory, focus: &str, kind: SlotKind) -> Self {
        Self {
            category,
            focus: focus.to_string(),
            kind,
            question: None,
            answered: false,
            trigger: None,
        }
    }

    pub(crate) fn follow_up(category: QuestionCategory, trigger: &str) -> Self {
        Self {
            trigger: Some(trigger.to_string()),
            ..Self::new(category, "follow_up", SlotKind::FollowUp)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAllocation {
    pub category: QuestionCategory,
    pub target: usize,
    pub min: usize,
    pub max: usize,
    pub asked: usize,
}

/// What question templates may draw on. Captured at plan time so question
/// emission does not need the assessment again.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanContext {
    pub role: String,
    pub company: Option<String>,
    /// Skills worth probing, strongest evidence first.
    pub probe_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub red_flags: Vec<RedFlag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewPlan {
    pub candidate_id: Uuid,
    pub status: InterviewStatus,
    pub mode: PlanMode,
    /// True when the caller overrode the enrichment gate.
    pub forced: bool,
    pub total_questions: usize,
    pub min_questions: usize,
    pub max_questions: usize,
    pub allocations: Vec<CategoryAllocation>,
    pub slots: Vec<PlannedSlot>,
    pub cursor: usize,
    pub context: PlanContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewPlan {
    pub fn is_terminal(&self) -> bool {
        self.status == InterviewStatus::Completed
    }

    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|s| s.answered).count()
    }

    pub fn allocation(&self, category: QuestionCategory) -> Option<&CategoryAllocation> {
        self.allocations.iter().find(|a| a.category == category)
    }

    pub(crate) fn allocation_mut(&mut self, category: QuestionCategory) -> Option<&mut CategoryAllocation> {
        self.allocations.iter_mut().find(|a| a.category == category)
    }

    /// Replaces the wording of the outstanding question. Category, count and
    /// cursor are untouched.
    pub fn rephrase_current(&mut self, text: String) {
        if let Some(slot) = self.slots.get_mut(self.cursor) {
            if slot.question.is_some() && !slot.answered && slot.kind != SlotKind::IntegrityCheck {
                slot.question = Some(text);
            }
        }
    }

    /// Checks the count and bound invariants. A failure is a programming
    /// fault, never corrected silently.
    pub fn check_invariants(&self) -> Result<(), InterviewError> {
        let fail = |msg: String| Err(InterviewError::InvariantViolation(msg));
        let sum: usize = self.allocations.iter().map(|a| a.target).sum();
        if sum != self.total_questions {
            return fail(format!("category targets sum to {sum}, total is {}", self.total_questions));
        }
        if self.total_questions < self.min_questions || self.total_questions > self.max_questions {
            return fail(format!(
                "total {} outside [{}, {}]",
                self.total_questions, self.min_questions, self.max_questions
            ));
        }
        if self.slots.len() != self.total_questions {
            return fail(format!("{} slots for {} questions", self.slots.len(), self.total_questions));
        }
        if self.cursor > self.slots.len() {
            return fail(format!("cursor {} beyond {} slots", self.cursor, self.slots.len()));
        }
        for a in &self.allocations {
            if a.target < a.min || a.target > a.max {
                return fail(format!("{} target {} outside [{}, {}]", a.category, a.target, a.min, a.max));
            }
            let slots = self.slots.iter().filter(|s| s.category == a.category).count();
            if slots != a.target {
                return fail(format!("{} has {slots} slots for target {}", a.category, a.target));
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Allocation
// ────────────────────────────────────────────────────────────────────────────

/// Splits `total` across categories: every category starts at its minimum,
/// the rest is shared in proportion to `weights` (capped at each maximum),
/// and whatever rounding leaves goes to the highest-weighted category that
/// still has room. Returns counts in `QuestionCategory::ALL` order.
pub fn allocate(
    config: &InterviewConfig,
    total: usize,
    weights: &[f64; 5],
) -> Result<[usize; 5], InterviewError> {
    let bounds: Vec<_> = QuestionCategory::ALL
        .iter()
        .map(|c| config.categories.get(*c))
        .collect();
    let sum_min: usize = bounds.iter().map(|b| b.min).sum();
    if total < sum_min {
        return Err(InterviewError::InvariantViolation(format!(
            "total {total} below category minimums {sum_min}"
        )));
    }

    let mut counts = [0usize; 5];
    for (i, b) in bounds.iter().enumerate() {
        counts[i] = b.min;
    }

    let remaining = total - sum_min;
    let weight_sum: f64 = weights.iter().sum();
    if remaining > 0 && weight_sum > 0.0 {
        for (i, b) in bounds.iter().enumerate() {
            let share = (remaining as f64 * weights[i] / weight_sum).floor() as usize;
            counts[i] += share.min(b.max - b.min);
        }
    }

    let mut order: Vec<usize> = (0..5).collect();
    // Stable sort keeps declaration order among equal weights.
    order.sort_by(|a, b| weights[*b].total_cmp(&weights[*a]));

    let mut leftover = total - counts.iter().sum::<usize>();
    while leftover > 0 {
        let slot = order.iter().copied().find(|i| counts[*i] < bounds[*i].max);
        match slot {
            Some(i) => {
                counts[i] += 1;
                leftover -= 1;
            }
            None => {
                return Err(InterviewError::InvariantViolation(format!(
                    "category maximums cannot hold {total} questions"
                )))
            }
        }
    }
    Ok(counts)
}

/// Orders slots: technical first, then experience, then motivation and
/// behavioral interleaved, then culture.
pub(crate) fn sequence(counts: &[usize; 5], focus_for: impl Fn(QuestionCategory, usize) -> String) -> Vec<PlannedSlot> {
    use QuestionCategory::*;

    let make = |category: QuestionCategory, i: usize| {
        PlannedSlot::new(category, &focus_for(category, i), SlotKind::Planned)
    };

    let mut slots = Vec::new();
    for i in 0..counts[TechnicalDepth.index()] {
        slots.push(make(TechnicalDepth, i));
    }
    for i in 0..counts[ExperienceValidation.index()] {
        slots.push(make(ExperienceValidation, i));
    }
    let motivation = counts[MotivationAlignment.index()];
    let behavioral = counts[BehavioralAssessment.index()];
    for i in 0..motivation.max(behavioral) {
        if i < motivation {
            slots.push(make(MotivationAlignment, i));
        }
        if i < behavioral {
            slots.push(make(BehavioralAssessment, i));
        }
    }
    for i in 0..counts[CultureFit.index()] {
        slots.push(make(CultureFit, i));
    }
    slots
}

/// Marks the last technical slot as the integrity probe.
pub(crate) fn mark_integrity_slot(slots: &mut [PlannedSlot]) {
    if let Some(slot) = slots
        .iter_mut()
        .rev()
        .find(|s| s.category == QuestionCategory::TechnicalDepth)
    {
        slot.kind = SlotKind::IntegrityCheck;
        slot.focus = "integrity_check".to_string();
    }
}
