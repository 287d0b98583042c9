use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::DataSource;

/// A candidate as supplied by the caller. The pipeline reads it and may fill
/// in resume-derived fields on ingest, but never deletes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub job_id: Option<i64>,
    pub full_name: String,
    #[serde(default)]
    pub resume_text: String,
    /// "Tell us about yourself".
    #[serde(default)]
    pub intro: Option<String>,
    /// "Why do you want to work with us".
    #[serde(default)]
    pub why_us: Option<String>,
    #[serde(default)]
    pub declared_skills: Vec<String>,
    #[serde(default)]
    pub declared_years_experience: Option<u32>,
    #[serde(default)]
    pub professional_profile_url: Option<String>,
    #[serde(default)]
    pub code_hosting_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CandidateRecord {
    /// Non-empty motivation answers, in a stable order.
    pub fn motivation_fields(&self) -> Vec<&str> {
        [self.intro.as_deref(), self.why_us.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn motivation_text(&self) -> String {
        self.motivation_fields().join("\n")
    }

    pub fn profile_url(&self, source: DataSource) -> Option<&str> {
        let url = match source {
            DataSource::ProfessionalNetwork => self.professional_profile_url.as_deref(),
            DataSource::CodeHosting => self.code_hosting_url.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }

    /// Sources the enrichment stage is expected to fetch for this candidate.
    pub fn expected_sources(&self) -> Vec<DataSource> {
        DataSource::ALL
            .into_iter()
            .filter(|s| self.profile_url(*s).is_some())
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_candidate() -> CandidateRecord {
    CandidateRecord {
        id: Uuid::new_v4(),
        job_id: Some(42),
        full_name: "Asha Rai".to_string(),
        resume_text: String::new(),
        intro: None,
        why_us: None,
        declared_skills: Vec::new(),
        declared_years_experience: None,
        professional_profile_url: None,
        code_hosting_url: None,
        created_at: Utc::now(),
    }
}
