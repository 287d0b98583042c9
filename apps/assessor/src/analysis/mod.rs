//! Profile analysis: fuses resume signals, declared data, the job requirement
//! and third-party payloads into one immutable `ProfileAssessment`.
//!
//! `ProfileAnalyzer::analyze` is a pure function of its `AnalysisInput`.
//! Everything order-sensitive uses sorted collections so that repeated runs
//! on the same input serialize identically.

pub mod completeness;
pub mod credibility;
pub mod experience;
pub mod skills;
pub mod tenure;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{focus_keywords, mentions};
use crate::models::{
    CandidateRecord, CodeHostingProfile, DataSource, JobRequirement, ProfessionalProfile,
};
use crate::signals::{SignalBundle, SignalContext, SignalExtractor};

pub use completeness::{CompletenessReport, CompletenessWeights};
pub use credibility::RedFlag;
pub use experience::ExperienceEstimate;
pub use skills::{SkillMatch, SkillMatcher};
pub use tenure::TenureProfile;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub completeness: CompletenessWeights,
    pub min_resume_chars: usize,
    pub min_declared_skills: usize,
    /// Alias → canonical skill name, compared case-insensitively.
    pub skill_aliases: BTreeMap<String, String>,
    /// Declared skills that code-hosting activity is expected to corroborate.
    pub code_verifiable_skills: Vec<String>,
    /// Normalized Levenshtein similarity at or above which two employer
    /// names are treated as the same company.
    pub employer_similarity_threshold: f64,
    pub tenure_tolerance_years: f64,
    pub sparse_profile_threshold: f64,
    /// Uncorroborated skills tolerated before any is flagged.
    pub uncorroborated_skill_tolerance: usize,
    pub credibility_penalty_per_flag: f64,
    /// Credibility baseline with one third-party payload.
    pub partially_verified_credibility: f64,
    /// Credibility baseline with no third-party payload.
    pub unverified_credibility: f64,
    /// Used in place of a match ratio when the job lists no skills (or no
    /// focus tags) for a component.
    pub neutral_ratio: f64,
    /// Completeness below this counts as a low-confidence indicator.
    pub low_completeness_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            completeness: CompletenessWeights::default(),
            min_resume_chars: 300,
            min_declared_skills: 3,
            skill_aliases: skills::default_skill_aliases(),
            code_verifiable_skills: [
                "python", "java", "javascript", "typescript", "go", "rust", "c++", "c#", "ruby",
                "php", "swift", "kotlin", "scala",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            employer_similarity_threshold: 0.8,
            tenure_tolerance_years: 3.0,
            sparse_profile_threshold: 0.5,
            uncorroborated_skill_tolerance: 1,
            credibility_penalty_per_flag: 0.15,
            partially_verified_credibility: 0.8,
            unverified_credibility: 0.6,
            neutral_ratio: 0.5,
            low_completeness_threshold: 0.5,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), String> {
        let unit = [
            ("employer_similarity_threshold", self.employer_similarity_threshold),
            ("sparse_profile_threshold", self.sparse_profile_threshold),
            ("credibility_penalty_per_flag", self.credibility_penalty_per_flag),
            ("partially_verified_credibility", self.partially_verified_credibility),
            ("unverified_credibility", self.unverified_credibility),
            ("neutral_ratio", self.neutral_ratio),
            ("low_completeness_threshold", self.low_completeness_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("analyzer.{name} must be within [0, 1], got {value}"));
            }
        }
        for (component, weight) in self.completeness.as_table() {
            if weight < 0.0 {
                return Err(format!("completeness weight for {component:?} is negative"));
            }
        }
        if self.tenure_tolerance_years < 0.0 {
            return Err("analyzer.tenure_tolerance_years is negative".to_string());
        }
        Ok(())
    }
}

/// Weights of the "enhanced role fit" components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoleFitWeights {
    pub mandatory_skills: f64,
    pub preferred_skills: f64,
    pub experience_level: f64,
    pub technical_focus: f64,
}

impl Default for RoleFitWeights {
    fn default() -> Self {
        Self {
            mandatory_skills: 0.40,
            preferred_skills: 0.25,
            experience_level: 0.20,
            technical_focus: 0.15,
        }
    }
}

impl RoleFitWeights {
    pub fn total(&self) -> f64 {
        self.mandatory_skills + self.preferred_skills + self.experience_level + self.technical_focus
    }
}

/// Role-fit components, each in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleFit {
    pub mandatory_skills: f64,
    pub preferred_skills: f64,
    pub experience_level: f64,
    pub technical_focus: f64,
}

impl RoleFit {
    pub fn combine(&self, weights: &RoleFitWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let sum = self.mandatory_skills * weights.mandatory_skills
            + self.preferred_skills * weights.preferred_skills
            + self.experience_level * weights.experience_level
            + self.technical_focus * weights.technical_focus;
        (sum / total).clamp(0.0, 1.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output snapshot
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    CredentialVerification,
    SkillGapAssessment,
    LeadershipValidation,
    AuthenticityCheck,
    ProjectDeepDive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileAssessment {
    pub candidate_id: Uuid,
    pub as_of: NaiveDate,
    pub degraded: bool,
    pub missing_sources: Vec<DataSource>,
    pub completeness: CompletenessReport,
    pub skill_match: SkillMatch,
    pub experience: ExperienceEstimate,
    pub credibility: f64,
    pub role_fit: RoleFit,
    pub job_fit: f64,
    pub tenure: TenureProfile,
    pub behavioral_indicators: Vec<String>,
    pub red_flags: Vec<RedFlag>,
    pub focus_areas: Vec<FocusArea>,
    pub resume_signals: SignalBundle,
    pub motivation_signals: SignalBundle,
}

impl ProfileAssessment {
    /// Indicators that the profile leaves open questions: the experience
    /// estimate is uncertain, or the profile is thin.
    pub fn low_confidence_indicators(&self, low_completeness_threshold: f64) -> usize {
        self.experience.low_confidence as usize
            + (self.completeness.overall_score < low_completeness_threshold) as usize
    }
}

/// Everything `ProfileAnalyzer::analyze` reads. Holding references keeps the
/// analysis a pure function of one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub candidate: &'a CandidateRecord,
    pub job: &'a JobRequirement,
    pub professional: Option<&'a ProfessionalProfile>,
    pub code_hosting: Option<&'a CodeHostingProfile>,
    /// Reference date for open-ended employments.
    pub as_of: NaiveDate,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct ProfileAnalyzer {
    config: AnalyzerConfig,
    role_fit_weights: RoleFitWeights,
    matcher: SkillMatcher,
    signals: SignalExtractor,
}

impl ProfileAnalyzer {
    pub fn new(config: AnalyzerConfig, role_fit_weights: RoleFitWeights, signals: SignalExtractor) -> Self {
        let matcher = SkillMatcher::new(&config.skill_aliases);
        Self {
            config,
            role_fit_weights,
            matcher,
            signals,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn signals(&self) -> &SignalExtractor {
        &self.signals
    }

    pub fn analyze(&self, input: AnalysisInput<'_>) -> ProfileAssessment {
        let candidate = input.candidate;
        let cfg = &self.config;

        let missing_sources: Vec<DataSource> = candidate
            .expected_sources()
            .into_iter()
            .filter(|s| match s {
                DataSource::ProfessionalNetwork => input.professional.is_none(),
                DataSource::CodeHosting => input.code_hosting.is_none(),
            })
            .collect();
        let degraded = input.professional.is_none() || input.code_hosting.is_none();

        let resume_signals = self.signals.extract(&candidate.resume_text, SignalContext::Resume);
        let motivation_signals = self
            .signals
            .extract(&candidate.motivation_text(), SignalContext::InterviewAnswer);

        let completeness = completeness::compute_completeness_report(
            candidate,
            &cfg.completeness,
            cfg.min_resume_chars,
            cfg.min_declared_skills,
        );
        let skill_match = skills::match_skills(
            &self.matcher,
            &candidate.declared_skills,
            input.code_hosting.map(|c| &c.skills_detected),
            input.job,
        );
        let experience =
            experience::estimate_experience(&candidate.resume_text, candidate.declared_years_experience);
        let credibility = credibility::assess_credibility(
            cfg,
            &skill_match,
            experience.years,
            input.professional,
            input.code_hosting,
            input.as_of,
        );
        let tenure = tenure::tenure_profile(input.professional, &candidate.resume_text, input.as_of);

        let role_fit = self.role_fit(&input, &skill_match, &experience);
        let job_fit = role_fit.combine(&self.role_fit_weights);

        let behavioral_indicators =
            behavioral_indicators(&resume_signals, &motivation_signals, input.code_hosting, &input);
        let focus_areas = focus_areas(
            credibility.score,
            &skill_match,
            &experience,
            !credibility.red_flags.is_empty() || degraded,
            input.code_hosting,
        );

        ProfileAssessment {
            candidate_id: candidate.id,
            as_of: input.as_of,
            degraded,
            missing_sources,
            completeness,
            skill_match,
            experience,
            credibility: credibility.score,
            role_fit,
            job_fit,
            tenure,
            behavioral_indicators,
            red_flags: credibility.red_flags,
            focus_areas,
            resume_signals,
            motivation_signals,
        }
    }

    fn role_fit(
        &self,
        input: &AnalysisInput<'_>,
        skills: &SkillMatch,
        experience: &ExperienceEstimate,
    ) -> RoleFit {
        let neutral = self.config.neutral_ratio;

        let gap = experience.level.rank() - input.job.seniority.rank();
        let experience_level = match gap {
            0 | 1 => 1.0,
            g if g > 1 => 0.85,
            g => (1.0 + 0.3 * g as f64).max(0.0),
        };

        let technical_focus = if input.job.technical_focus.is_empty() {
            neutral
        } else {
            let mut haystack = input.candidate.resume_text.clone();
            for skill in skills.all_skills() {
                haystack.push(' ');
                haystack.push_str(&skill);
            }
            if let Some(code) = input.code_hosting {
                for topic in &code.topics {
                    haystack.push(' ');
                    haystack.push_str(topic);
                }
            }
            let aligned = input
                .job
                .technical_focus
                .iter()
                .filter(|tag| {
                    let keywords = focus_keywords(tag);
                    mentions(&haystack, &tag.replace('_', " "))
                        || keywords.iter().any(|kw| mentions(&haystack, kw))
                })
                .count();
            aligned as f64 / input.job.technical_focus.len() as f64
        };

        RoleFit {
            mandatory_skills: skills.mandatory.ratio.unwrap_or(neutral),
            preferred_skills: skills.preferred.ratio.unwrap_or(neutral),
            experience_level,
            technical_focus,
        }
    }
}

const TEAM_WORDS: &[&str] = &["team", "collaborated", "cross-functional", "mentored", "pair"];

fn behavioral_indicators(
    resume: &SignalBundle,
    motivation: &SignalBundle,
    code: Option<&CodeHostingProfile>,
    input: &AnalysisInput<'_>,
) -> Vec<String> {
    let mut out = Vec::new();
    if TEAM_WORDS.iter().any(|w| mentions(&input.candidate.resume_text, w)) {
        out.push("team_experience_mentioned".to_string());
    }
    if code.is_some_and(|c| c.recently_active_repos >= 3 || c.public_repos >= 10) {
        out.push("active_open_source_contributor".to_string());
    }
    if resume.quantifier_count >= 3 {
        out.push("quantified_achievements".to_string());
    }
    if motivation.word_count >= 40 && motivation.specificity() >= 0.5 {
        out.push("detailed_motivation".to_string());
    }
    if resume.credential_mentions > 0 {
        out.push("credentials_listed".to_string());
    }
    if input.professional.is_some() && input.code_hosting.is_some() {
        out.push("verified_online_presence".to_string());
    }
    out
}

fn focus_areas(
    credibility: f64,
    skills: &SkillMatch,
    experience: &ExperienceEstimate,
    authenticity_concern: bool,
    code: Option<&CodeHostingProfile>,
) -> Vec<FocusArea> {
    let mut areas = Vec::new();
    if credibility < 0.7 {
        areas.push(FocusArea::CredentialVerification);
    }
    if skills.mandatory.ratio.is_some_and(|r| r < 0.8) {
        areas.push(FocusArea::SkillGapAssessment);
    }
    if experience.level >= crate::models::SeniorityLevel::Senior {
        areas.push(FocusArea::LeadershipValidation);
    }
    if authenticity_concern {
        areas.push(FocusArea::AuthenticityCheck);
    }
    if code.is_some_and(|c| c.public_repos > 5) {
        areas.push(FocusArea::ProjectDeepDive);
    }
    areas
}
