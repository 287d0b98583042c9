use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::skills::SkillMatch;
use crate::analysis::AnalyzerConfig;
use crate::models::{CodeHostingProfile, ProfessionalProfile};

/// A tagged credibility or consistency concern, e.g.
/// `employer_mismatch:acme|globex` or `uncorroborated_skill:rust`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RedFlag(pub String);

impl RedFlag {
    pub fn new(kind: &str, detail: Option<&str>) -> Self {
        match detail {
            Some(d) => Self(format!("{kind}:{d}")),
            None => Self(kind.to_string()),
        }
    }

    pub fn kind(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const EMPLOYER_MISMATCH: &str = "employer_mismatch";
pub const UNCORROBORATED_SKILL: &str = "uncorroborated_skill";
pub const TENURE_MISMATCH: &str = "tenure_mismatch";
pub const SPARSE_PROFESSIONAL_PROFILE: &str = "sparse_professional_profile";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredibilityReport {
    pub score: f64,
    pub red_flags: Vec<RedFlag>,
    /// Number of third-party payloads the checks could use.
    pub verified_sources: usize,
}

const COMPANY_SUFFIXES: &[&str] = &[
    "inc", "llc", "ltd", "limited", "corp", "corporation", "co", "gmbh", "pvt", "plc",
];

fn normalize_company(name: &str) -> String {
    name.trim_start_matches('@')
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !COMPANY_SUFFIXES.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn same_employer(a: &str, b: &str, threshold: f64) -> bool {
    let (a, b) = (normalize_company(a), normalize_company(b));
    if a.is_empty() || b.is_empty() {
        return true;
    }
    a.contains(&b) || b.contains(&a) || strsim::normalized_levenshtein(&a, &b) >= threshold
}

/// Cross-checks claims between the resume, the professional-network payload,
/// and the code-hosting payload. Checks whose inputs are absent are skipped.
pub fn assess_credibility(
    config: &AnalyzerConfig,
    skills: &SkillMatch,
    claimed_years: Option<u32>,
    professional: Option<&ProfessionalProfile>,
    code: Option<&CodeHostingProfile>,
    as_of: NaiveDate,
) -> CredibilityReport {
    let mut flags: BTreeSet<RedFlag> = BTreeSet::new();

    if let (Some(p), Some(c)) = (professional, code) {
        if let (Some(employer), Some(company)) = (p.current_company.as_deref(), c.company.as_deref()) {
            if !same_employer(employer, company, config.employer_similarity_threshold) {
                let detail = format!("{}|{}", normalize_company(employer), normalize_company(company));
                flags.insert(RedFlag::new(EMPLOYER_MISMATCH, Some(&detail)));
            }
        }
    }

    if let Some(c) = code.filter(|c| c.public_repos > 0) {
        let verifiable: BTreeSet<String> = config
            .code_verifiable_skills
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let uncorroborated: Vec<&String> = skills
            .declared
            .iter()
            .filter(|s| verifiable.contains(*s) && !c.skills_detected.contains(*s) && !skills.code_derived.contains(*s))
            .collect();
        if uncorroborated.len() > config.uncorroborated_skill_tolerance {
            for skill in uncorroborated {
                flags.insert(RedFlag::new(UNCORROBORATED_SKILL, Some(skill)));
            }
        }
    }

    if let Some(p) = professional {
        if let Some(claimed) = claimed_years.filter(|_| !p.employments.is_empty()) {
            let listed = p.experience_years(as_of);
            if (claimed as f64 - listed).abs() > config.tenure_tolerance_years {
                let detail = format!("claimed={claimed},listed={listed:.1}");
                flags.insert(RedFlag::new(TENURE_MISMATCH, Some(&detail)));
            }
        }
        if p.completeness() < config.sparse_profile_threshold {
            flags.insert(RedFlag::new(SPARSE_PROFESSIONAL_PROFILE, None));
        }
    }

    let verified_sources = professional.is_some() as usize + code.is_some() as usize;
    let base = match verified_sources {
        2 => 1.0,
        1 => config.partially_verified_credibility,
        _ => config.unverified_credibility,
    };
    let score = (base - config.credibility_penalty_per_flag * flags.len() as f64).max(0.0);

    CredibilityReport {
        score,
        red_flags: flags.into_iter().collect(),
        verified_sources,
    }
}
