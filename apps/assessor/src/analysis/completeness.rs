use serde::{Deserialize, Serialize};

use crate::models::CandidateRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessComponent {
    Resume,
    DeclaredSkills,
    SocialLinks,
    Motivation,
}

/// Weight each component subtracts from 1.0 when missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletenessWeights {
    pub resume: f64,
    pub declared_skills: f64,
    pub social_links: f64,
    pub motivation: f64,
}

impl Default for CompletenessWeights {
    fn default() -> Self {
        Self {
            resume: 0.35,
            declared_skills: 0.25,
            social_links: 0.20,
            motivation: 0.20,
        }
    }
}

impl CompletenessWeights {
    pub fn as_table(&self) -> [(CompletenessComponent, f64); 4] {
        [
            (CompletenessComponent::Resume, self.resume),
            (CompletenessComponent::DeclaredSkills, self.declared_skills),
            (CompletenessComponent::SocialLinks, self.social_links),
            (CompletenessComponent::Motivation, self.motivation),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletenessFactor {
    pub component: CompletenessComponent,
    pub weight: f64,
    pub present: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub factors: Vec<CompletenessFactor>,
    pub missing_components: Vec<CompletenessComponent>,
    pub recommendations: Vec<String>,
}

pub fn compute_completeness_report(
    candidate: &CandidateRecord,
    weights: &CompletenessWeights,
    min_resume_chars: usize,
    min_declared_skills: usize,
) -> CompletenessReport {
    let resume_chars = candidate.resume_text.trim().chars().count();
    let skill_count = candidate
        .declared_skills
        .iter()
        .filter(|s| !s.trim().is_empty())
        .count();
    let links = candidate.expected_sources().len();
    let motivation = candidate.motivation_fields().len();

    let mut factors = Vec::new();
    let mut missing_components = Vec::new();
    let mut recommendations = Vec::new();
    let mut score = 1.0;

    for (component, weight) in weights.as_table() {
        let (present, detail, recommendation) = match component {
            CompletenessComponent::Resume => (
                resume_chars >= min_resume_chars,
                format!("{resume_chars} characters of resume text"),
                "Request a fuller resume with role history and outcomes",
            ),
            CompletenessComponent::DeclaredSkills => (
                skill_count >= min_declared_skills,
                format!("{skill_count} declared skills"),
                "Probe technical skills directly during the interview",
            ),
            CompletenessComponent::SocialLinks => (
                links == 2,
                format!("{links} of 2 profile links"),
                "Verify professional and code-hosting presence",
            ),
            CompletenessComponent::Motivation => (
                motivation == 2,
                format!("{motivation} of 2 motivation answers"),
                "Probe motivation and interest in the role",
            ),
        };
        if !present {
            score -= weight;
            missing_components.push(component);
            recommendations.push(recommendation.to_string());
        }
        factors.push(CompletenessFactor {
            component,
            weight,
            present,
            detail,
        });
    }

    CompletenessReport {
        overall_score: f64::clamp(score, 0.0, 1.0),
        factors,
        missing_components,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::sample_candidate;

    fn report(c: &CandidateRecord) -> CompletenessReport {
        compute_completeness_report(c, &CompletenessWeights::default(), 200, 3)
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let r = report(&sample_candidate());
        assert!(r.overall_score.abs() < 1e-9, "got {}", r.overall_score);
        assert_eq!(r.missing_components.len(), 4);
        assert_eq!(r.recommendations.len(), 4);
    }

    #[test]
    fn test_each_missing_component_subtracts_its_weight() {
        let mut c = sample_candidate();
        c.resume_text = "x".repeat(250);
        c.declared_skills = vec!["rust".into(), "sql".into(), "go".into()];
        c.intro = Some("hi".into());
        c.why_us = Some("mission".into());
        let r = report(&c);
        // Only the social links are missing.
        assert!((r.overall_score - 0.80).abs() < 1e-9);
        assert_eq!(r.missing_components, vec![CompletenessComponent::SocialLinks]);
    }

    #[test]
    fn test_one_link_is_not_enough() {
        let mut c = sample_candidate();
        c.code_hosting_url = Some("https://github.com/a".into());
        let r = report(&c);
        let links = r
            .factors
            .iter()
            .find(|f| f.component == CompletenessComponent::SocialLinks)
            .unwrap();
        assert!(!links.present);
    }
}
