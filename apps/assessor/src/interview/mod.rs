//! Adaptive interview: plan construction, the question-sequencing state
//! machine, question templates and optional phrasing augmentation.

pub mod phrasing;
pub mod plan;
pub mod planner;
pub mod prompts;
pub mod questions;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::signals::SignalBundle;

pub use phrasing::{LlmQuestionPhraser, QuestionPhraser};
pub use plan::{InterviewPlan, InterviewStatus, PlannedSlot, SlotKind};
pub use planner::{AnswerOutcome, InterviewPlanner, PlanRequest, QuestionPrompt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    TechnicalDepth,
    ExperienceValidation,
    MotivationAlignment,
    BehavioralAssessment,
    CultureFit,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 5] = [
        QuestionCategory::TechnicalDepth,
        QuestionCategory::ExperienceValidation,
        QuestionCategory::MotivationAlignment,
        QuestionCategory::BehavioralAssessment,
        QuestionCategory::CultureFit,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestionCategory::TechnicalDepth => "technical_depth",
            QuestionCategory::ExperienceValidation => "experience_validation",
            QuestionCategory::MotivationAlignment => "motivation_alignment",
            QuestionCategory::BehavioralAssessment => "behavioral_assessment",
            QuestionCategory::CultureFit => "culture_fit",
        };
        f.write_str(s)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryBounds {
    pub weight: f64,
    pub min: usize,
    pub max: usize,
}

impl CategoryBounds {
    const fn new(weight: f64, min: usize, max: usize) -> Self {
        Self { weight, min, max }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryTable {
    pub technical_depth: CategoryBounds,
    pub experience_validation: CategoryBounds,
    pub motivation_alignment: CategoryBounds,
    pub behavioral_assessment: CategoryBounds,
    pub culture_fit: CategoryBounds,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            technical_depth: CategoryBounds::new(0.30, 2, 5),
            experience_validation: CategoryBounds::new(0.25, 2, 4),
            motivation_alignment: CategoryBounds::new(0.20, 1, 3),
            behavioral_assessment: CategoryBounds::new(0.15, 1, 2),
            culture_fit: CategoryBounds::new(0.10, 1, 2),
        }
    }
}

impl CategoryTable {
    pub fn get(&self, category: QuestionCategory) -> &CategoryBounds {
        match category {
            QuestionCategory::TechnicalDepth => &self.technical_depth,
            QuestionCategory::ExperienceValidation => &self.experience_validation,
            QuestionCategory::MotivationAlignment => &self.motivation_alignment,
            QuestionCategory::BehavioralAssessment => &self.behavioral_assessment,
            QuestionCategory::CultureFit => &self.culture_fit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterviewConfig {
    pub min_questions: usize,
    pub max_questions: usize,
    /// Extra questions per red flag or low-confidence indicator.
    pub questions_per_signal: usize,
    pub categories: CategoryTable,
    pub include_integrity_check: bool,
    /// Hedge-word ratio at or above which an answer is flagged vague.
    pub vague_answer_threshold: f64,
    /// Answers shorter than this many words are flagged evasive.
    pub evasive_answer_words: usize,
    /// Minimum words for an integrity-check answer to count as confident.
    pub integrity_detail_words: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            min_questions: 8,
            max_questions: 15,
            questions_per_signal: 2,
            categories: CategoryTable::default(),
            include_integrity_check: true,
            vague_answer_threshold: 0.08,
            evasive_answer_words: 8,
            integrity_detail_words: 20,
        }
    }
}

impl InterviewConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_questions == 0 || self.min_questions > self.max_questions {
            return Err(format!(
                "interview bounds [{}, {}] are inconsistent",
                self.min_questions, self.max_questions
            ));
        }
        let mut sum_min = 0;
        let mut sum_max = 0;
        for category in QuestionCategory::ALL {
            let b = self.categories.get(category);
            if b.weight < 0.0 {
                return Err(format!("{category} weight is negative"));
            }
            if b.min > b.max {
                return Err(format!("{category} bounds [{}, {}] are inconsistent", b.min, b.max));
            }
            sum_min += b.min;
            sum_max += b.max;
        }
        if sum_min > self.min_questions {
            return Err(format!(
                "category minimums ({sum_min}) exceed the question floor ({})",
                self.min_questions
            ));
        }
        if sum_max < self.max_questions {
            return Err(format!(
                "category maximums ({sum_max}) cannot reach the question ceiling ({})",
                self.max_questions
            ));
        }
        if self.include_integrity_check && self.categories.technical_depth.min == 0 {
            return Err("integrity check needs technical_depth.min >= 1".to_string());
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Turns and errors
// ────────────────────────────────────────────────────────────────────────────

/// One question/answer pair. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewTurn {
    pub candidate_id: Uuid,
    pub turn_index: usize,
    pub slot_index: usize,
    pub category: QuestionCategory,
    pub kind: SlotKind,
    pub question: String,
    pub answer: String,
    pub signals: SignalBundle,
    /// Answer-level flags, e.g. `vague_answer`, `integrity_check_failed`.
    pub flags_raised: Vec<String>,
    pub answered_at: DateTime<Utc>,
}

pub const VAGUE_ANSWER: &str = "vague_answer";
pub const EVASIVE_ANSWER: &str = "evasive_answer";
pub const INTEGRITY_CHECK_FAILED: &str = "integrity_check_failed";

impl InterviewTurn {
    pub fn failed_integrity_check(&self) -> bool {
        self.flags_raised.iter().any(|f| f == INTEGRITY_CHECK_FAILED)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InterviewError {
    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    InvalidAnswer(String),

    #[error("interview plan invariant violated: {0}")]
    InvariantViolation(String),
}
