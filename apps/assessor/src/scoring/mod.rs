//! Composite fit scoring.
//!
//! The local weighted computation always runs. A holistic review from the
//! language model, when configured and well-formed, is blended in; otherwise
//! the local result stands and the score is marked `fallback`.

pub mod engine;
pub mod prompts;
pub mod review;
pub mod subscores;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::RoleFitWeights;

pub use engine::{ScoringEngine, ScoringError, ScoringInput};
pub use review::{HolisticReview, HolisticReviewer, LlmHolisticReviewer};
pub use subscores::Subscores;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DimensionWeights {
    pub role_fit: f64,
    pub capability_depth: f64,
    pub motivation_alignment: f64,
    pub reliability: f64,
    pub data_confidence: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            role_fit: 0.35,
            capability_depth: 0.20,
            motivation_alignment: 0.15,
            reliability: 0.15,
            data_confidence: 0.15,
        }
    }
}

impl DimensionWeights {
    fn as_array(&self) -> [f64; 5] {
        [
            self.role_fit,
            self.capability_depth,
            self.motivation_alignment,
            self.reliability,
            self.data_confidence,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: DimensionWeights,
    pub role_fit: RoleFitWeights,
    pub top_threshold: f64,
    pub borderline_threshold: f64,
    /// Multiplier applied when an integrity-check answer fails.
    pub fraud_penalty: f64,
    /// Multiplier reduction per credibility red flag.
    pub integrity_penalty_per_flag: f64,
    /// Floor for the red-flag part of the integrity multiplier.
    pub min_flag_multiplier: f64,
    /// Share of the holistic review score in the blended raw score.
    pub augmentation_weight: f64,
    /// Data-confidence multiplier when the assessment is degraded.
    pub degraded_confidence_factor: f64,
    /// Capability depth from resume signals is scaled by this when no
    /// interview answers exist.
    pub resume_only_depth_factor: f64,
    /// Motivation score when there is no motivation text at all.
    pub neutral_motivation: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: DimensionWeights::default(),
            role_fit: RoleFitWeights::default(),
            top_threshold: 0.75,
            borderline_threshold: 0.50,
            fraud_penalty: 0.25,
            integrity_penalty_per_flag: 0.05,
            min_flag_multiplier: 0.5,
            augmentation_weight: 0.3,
            degraded_confidence_factor: 0.7,
            resume_only_depth_factor: 0.6,
            neutral_motivation: 0.4,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.weights.as_array().iter().any(|w| *w < 0.0) {
            return Err("scoring dimension weights must be non-negative".to_string());
        }
        if self.weights.as_array().iter().sum::<f64>() <= 0.0 {
            return Err("scoring dimension weights sum to zero".to_string());
        }
        let rf = &self.role_fit;
        if [rf.mandatory_skills, rf.preferred_skills, rf.experience_level, rf.technical_focus]
            .iter()
            .any(|w| *w < 0.0)
            || rf.total() <= 0.0
        {
            return Err("role-fit weights must be non-negative and not all zero".to_string());
        }
        if !(0.0 <= self.borderline_threshold
            && self.borderline_threshold <= self.top_threshold
            && self.top_threshold <= 1.0)
        {
            return Err(format!(
                "bucket thresholds must satisfy 0 <= {} <= {} <= 1",
                self.borderline_threshold, self.top_threshold
            ));
        }
        let unit = [
            ("fraud_penalty", self.fraud_penalty),
            ("integrity_penalty_per_flag", self.integrity_penalty_per_flag),
            ("min_flag_multiplier", self.min_flag_multiplier),
            ("augmentation_weight", self.augmentation_weight),
            ("degraded_confidence_factor", self.degraded_confidence_factor),
            ("resume_only_depth_factor", self.resume_only_depth_factor),
            ("neutral_motivation", self.neutral_motivation),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("scoring.{name} must be within [0, 1], got {value}"));
            }
        }
        Ok(())
    }

    pub fn bucket(&self, score: f64) -> FitBucket {
        if score >= self.top_threshold {
            FitBucket::Top
        } else if score >= self.borderline_threshold {
            FitBucket::Borderline
        } else {
            FitBucket::Low
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FitBucket {
    Top,
    Borderline,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Local computation blended with a holistic review.
    Primary,
    /// Local computation only.
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeScore {
    pub candidate_id: Uuid,
    pub fit_score: f64,
    pub bucket: FitBucket,
    pub subscores: Subscores,
    /// Weighted dimension score before multipliers (after blending, if any).
    pub raw_score: f64,
    pub confidence_multiplier: f64,
    /// Combined fraud/integrity multiplier in [0, 1]; 1 means no penalty.
    pub integrity_penalty: f64,
    pub integrity_check_failed: bool,
    pub red_flag_count: usize,
    pub scoring_method: ScoringMethod,
    pub review: Option<HolisticReview>,
    /// Scored before the interview reached `completed`.
    pub forced: bool,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn sample_score(candidate_id: Uuid, fit_score: f64, bucket: FitBucket) -> CompositeScore {
    CompositeScore {
        candidate_id,
        fit_score,
        bucket,
        subscores: Subscores {
            role_fit: fit_score,
            capability_depth: fit_score,
            motivation_alignment: 0.5,
            reliability: 0.5,
            data_confidence: 0.7,
        },
        raw_score: fit_score,
        confidence_multiplier: 1.0,
        integrity_penalty: 1.0,
        integrity_check_failed: false,
        red_flag_count: 0,
        scoring_method: ScoringMethod::Fallback,
        review: None,
        forced: false,
        computed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries_are_inclusive_lower() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.bucket(0.75), FitBucket::Top);
        assert_eq!(cfg.bucket(0.7499999), FitBucket::Borderline);
        assert_eq!(cfg.bucket(0.50), FitBucket::Borderline);
        assert_eq!(cfg.bucket(0.4999999), FitBucket::Low);
        assert_eq!(cfg.bucket(1.0), FitBucket::Top);
        assert_eq!(cfg.bucket(0.0), FitBucket::Low);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(ScoringConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let cfg = ScoringConfig {
            top_threshold: 0.4,
            ..ScoringConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
