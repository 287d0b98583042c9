use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::ProfileAssessment;
use crate::interview::{InterviewTurn, SlotKind};
use crate::llm_client::prompts::{fill, FAIRNESS_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::JobRequirement;
use crate::scoring::prompts::REVIEW_PROMPT;
use crate::scoring::Subscores;

/// Answers longer than this are cut before they go into the prompt.
const MAX_ANSWER_CHARS: usize = 800;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolisticReview {
    pub fit_score: f64,
    pub consistency_score: f64,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

pub struct ReviewRequest<'a> {
    pub job: &'a JobRequirement,
    pub assessment: &'a ProfileAssessment,
    pub turns: &'a [InterviewTurn],
    pub subscores: &'a Subscores,
}

#[async_trait]
pub trait HolisticReviewer: Send + Sync {
    async fn review(&self, request: &ReviewRequest<'_>) -> Result<HolisticReview, LlmError>;
}

pub struct LlmHolisticReviewer(pub LlmClient);

#[async_trait]
impl HolisticReviewer for LlmHolisticReviewer {
    async fn review(&self, request: &ReviewRequest<'_>) -> Result<HolisticReview, LlmError> {
        let prompt = build_prompt(request)?;
        let review: HolisticReview = self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        validate_review(review)
    }
}

fn build_prompt(request: &ReviewRequest<'_>) -> Result<String, LlmError> {
    let a = request.assessment;
    let job = json!({
        "title": request.job.title,
        "seniority": request.job.seniority,
        "mandatory_skills": request.job.mandatory_skills,
        "preferred_skills": request.job.preferred_skills,
        "technical_focus": request.job.technical_focus,
        "industry": request.job.industry,
    });
    let assessment = json!({
        "degraded": a.degraded,
        "missing_sources": a.missing_sources,
        "completeness": a.completeness.overall_score,
        "mandatory_skill_hits": a.skill_match.mandatory.hits,
        "mandatory_skill_missing": a.skill_match.mandatory.missing,
        "experience_level": a.experience.level,
        "experience_low_confidence": a.experience.low_confidence,
        "credibility": a.credibility,
        "red_flags": a.red_flags,
        "behavioral_indicators": a.behavioral_indicators,
    });
    let transcript: Vec<_> = request
        .turns
        .iter()
        .filter(|t| t.kind != SlotKind::IntegrityCheck)
        .map(|t| {
            json!({
                "category": t.category,
                "question": t.question,
                "answer": t.answer.chars().take(MAX_ANSWER_CHARS).collect::<String>(),
            })
        })
        .collect();

    Ok(fill(
        REVIEW_PROMPT,
        &[
            ("job", &serde_json::to_string_pretty(&job)?),
            ("assessment", &serde_json::to_string_pretty(&assessment)?),
            ("subscores", &serde_json::to_string_pretty(request.subscores)?),
            ("transcript", &serde_json::to_string_pretty(&transcript)?),
            ("fairness", FAIRNESS_INSTRUCTION),
        ],
    ))
}

/// Out-of-range numbers make the whole review unusable.
pub(crate) fn validate_review(review: HolisticReview) -> Result<HolisticReview, LlmError> {
    for (name, value) in [("fit_score", review.fit_score), ("consistency_score", review.consistency_score)] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(LlmError::Malformed(format!("{name} {value} is outside [0, 1]")));
        }
    }
    let clean = |items: Vec<String>| -> Vec<String> {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };
    Ok(HolisticReview {
        insights: clean(review.insights),
        red_flags: clean(review.red_flags),
        ..review
    })
}
