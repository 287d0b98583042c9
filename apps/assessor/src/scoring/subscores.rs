//! The five local scoring dimensions. Each is a pure function of the
//! assessment and the interview turns, in [0, 1].

use serde::{Deserialize, Serialize};

use crate::analysis::ProfileAssessment;
use crate::interview::{InterviewPlan, InterviewTurn, QuestionCategory, SlotKind};
use crate::models::job::mentions;
use crate::models::CandidateRecord;
use crate::scoring::ScoringConfig;
use crate::signals::SignalBundle;

/// Technical density at which the density part of depth saturates.
const DENSITY_SATURATION: f64 = 0.08;
/// Reasoning markers per answer at which that part saturates.
const REASONING_SATURATION: f64 = 3.0;
/// Word count at which motivation detail saturates.
const MOTIVATION_WORDS_SATURATION: f64 = 60.0;

const BASE_TURNOVER_RISK: f64 = 0.3;

/// Phrases that signal the candidate plans to stay and grow.
const CAREER_GOAL_PHRASES: &[&str] = &[
    "long term",
    "long-term",
    "grow with",
    "career path",
    "build my career",
    "for years",
    "settle",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscores {
    pub role_fit: f64,
    pub capability_depth: f64,
    pub motivation_alignment: f64,
    pub reliability: f64,
    pub data_confidence: f64,
}

impl Subscores {
    pub fn weighted(&self, cfg: &ScoringConfig) -> f64 {
        let w = &cfg.weights;
        let total = w.role_fit + w.capability_depth + w.motivation_alignment + w.reliability + w.data_confidence;
        if total <= 0.0 {
            return 0.0;
        }
        let sum = self.role_fit * w.role_fit
            + self.capability_depth * w.capability_depth
            + self.motivation_alignment * w.motivation_alignment
            + self.reliability * w.reliability
            + self.data_confidence * w.data_confidence;
        (sum / total).clamp(0.0, 1.0)
    }
}

pub fn compute_subscores(
    cfg: &ScoringConfig,
    candidate: &CandidateRecord,
    assessment: &ProfileAssessment,
    plan: Option<&InterviewPlan>,
    turns: &[InterviewTurn],
) -> Subscores {
    Subscores {
        role_fit: assessment.role_fit.combine(&cfg.role_fit),
        capability_depth: capability_depth(cfg, assessment, turns),
        motivation_alignment: motivation_alignment(cfg, assessment, turns),
        reliability: 1.0 - turnover_risk(assessment, candidate, turns),
        data_confidence: data_confidence(cfg, assessment, plan, turns),
    }
}

fn depth_of(signals: &SignalBundle) -> f64 {
    let density = (signals.technical_density / DENSITY_SATURATION).min(1.0);
    let reasoning = (signals.reasoning_markers as f64 / REASONING_SATURATION).min(1.0);
    (0.4 * density + 0.3 * signals.quantification + 0.3 * reasoning).clamp(0.0, 1.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean depth over answered non-integrity turns. Without any, resume
/// signals stand in at a discount.
fn capability_depth(cfg: &ScoringConfig, assessment: &ProfileAssessment, turns: &[InterviewTurn]) -> f64 {
    let answered = turns
        .iter()
        .filter(|t| t.kind != SlotKind::IntegrityCheck && !t.signals.is_empty())
        .map(|t| depth_of(&t.signals));
    match mean(answered) {
        Some(depth) => depth,
        None => depth_of(&assessment.resume_signals) * cfg.resume_only_depth_factor,
    }
}

fn motivation_of(signals: &SignalBundle) -> f64 {
    let tone = (signals.sentiment + 1.0) / 2.0;
    let detail = (signals.word_count as f64 / MOTIVATION_WORDS_SATURATION).min(1.0);
    (0.4 * tone + 0.3 * signals.specificity() + 0.3 * detail).clamp(0.0, 1.0)
}

fn motivation_alignment(cfg: &ScoringConfig, assessment: &ProfileAssessment, turns: &[InterviewTurn]) -> f64 {
    let fields = std::iter::once(&assessment.motivation_signals).filter(|s| !s.is_empty());
    let answers = turns
        .iter()
        .filter(|t| t.category == QuestionCategory::MotivationAlignment)
        .map(|t| &t.signals)
        .filter(|s| !s.is_empty());
    mean(fields.chain(answers).map(motivation_of)).unwrap_or(cfg.neutral_motivation)
}

/// Estimated turnover risk from tenure pattern and stated career goals.
pub fn turnover_risk(assessment: &ProfileAssessment, candidate: &CandidateRecord, turns: &[InterviewTurn]) -> f64 {
    let tenure = &assessment.tenure;
    let mut risk = BASE_TURNOVER_RISK;

    if tenure.positions >= 2 {
        if let Some(avg) = tenure.average_tenure_months {
            if avg < 12.0 {
                risk += 0.3;
            } else if avg < 24.0 {
                risk += 0.15;
            } else if avg >= 36.0 {
                risk -= 0.1;
            }
        }
    }
    if tenure.short_stints >= 2 {
        risk += 0.1;
    }

    let motivation = candidate.motivation_text();
    let says_staying = std::iter::once(motivation.as_str())
        .chain(
            turns
                .iter()
                .filter(|t| t.category == QuestionCategory::MotivationAlignment)
                .map(|t| t.answer.as_str()),
        )
        .any(|text| CAREER_GOAL_PHRASES.iter().any(|p| mentions(text, p)));
    if says_staying {
        risk -= 0.1;
    }

    risk.clamp(0.05, 0.95)
}

/// Profile completeness blended with interview coverage, discounted when
/// third-party data is missing.
fn data_confidence(
    cfg: &ScoringConfig,
    assessment: &ProfileAssessment,
    plan: Option<&InterviewPlan>,
    turns: &[InterviewTurn],
) -> f64 {
    let coverage = match plan {
        Some(p) if p.total_questions > 0 => {
            let answered = turns.iter().filter(|t| t.kind != SlotKind::FollowUp).count();
            let planned = p.slots.iter().filter(|s| s.kind != SlotKind::FollowUp).count().max(1);
            (answered as f64 / planned as f64).min(1.0)
        }
        _ => 0.0,
    };
    let mut confidence = 0.6 * assessment.completeness.overall_score + 0.4 * coverage;
    if assessment.degraded {
        confidence *= cfg.degraded_confidence_factor;
    }
    confidence.clamp(0.0, 1.0)
}
