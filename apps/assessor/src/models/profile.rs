use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The third-party sources the enrichment stage fetches from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    ProfessionalNetwork,
    CodeHosting,
}

impl DataSource {
    pub const ALL: [DataSource; 2] = [DataSource::ProfessionalNetwork, DataSource::CodeHosting];
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::ProfessionalNetwork => write!(f, "professional_network"),
            DataSource::CodeHosting => write!(f, "code_hosting"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employment {
    pub company: String,
    pub title: String,
    pub start_date: NaiveDate,
    /// `None` for the current position.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Employment {
    pub fn months(&self, as_of: NaiveDate) -> u32 {
        let end = self.end_date.unwrap_or(as_of);
        let months = (end.year() - self.start_date.year()) * 12 + end.month() as i32
            - self.start_date.month() as i32;
        months.max(0) as u32
    }
}

/// Payload returned by the professional-network scraping service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfessionalProfile {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub current_company: Option<String>,
    pub current_title: Option<String>,
    pub employments: Vec<Employment>,
    pub skills: Vec<String>,
    pub connections: u32,
    pub recommendations: u32,
}

impl ProfessionalProfile {
    /// Total years covered by listed employments, overlaps counted once.
    pub fn experience_years(&self, as_of: NaiveDate) -> f64 {
        let mut spans: Vec<(NaiveDate, NaiveDate)> = self
            .employments
            .iter()
            .map(|e| (e.start_date, e.end_date.unwrap_or(as_of)))
            .filter(|(s, e)| s <= e)
            .collect();
        spans.sort();

        let mut total_days = 0i64;
        let mut current: Option<(NaiveDate, NaiveDate)> = None;
        for (start, end) in spans {
            current = match current {
                Some((cs, ce)) if start <= ce => Some((cs, ce.max(end))),
                Some((cs, ce)) => {
                    total_days += (ce - cs).num_days();
                    Some((start, end))
                }
                None => Some((start, end)),
            };
        }
        if let Some((cs, ce)) = current {
            total_days += (ce - cs).num_days();
        }
        total_days as f64 / 365.25
    }

    /// Share of the profile's descriptive fields that are filled in.
    pub fn completeness(&self) -> f64 {
        let present = [
            self.full_name.is_some(),
            self.headline.is_some(),
            self.summary.as_deref().is_some_and(|s| !s.trim().is_empty()),
            self.current_company.is_some(),
            !self.employments.is_empty(),
            !self.skills.is_empty(),
        ];
        present.iter().filter(|p| **p).count() as f64 / present.len() as f64
    }
}

/// Payload assembled from the code-hosting API (user plus repositories).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeHostingProfile {
    pub username: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
    pub total_stars: u32,
    /// Repository count per primary language.
    pub languages: BTreeMap<String, u32>,
    pub topics: BTreeSet<String>,
    /// Lowercased skill tokens derived from languages and topics.
    pub skills_detected: BTreeSet<String>,
    /// Non-fork repositories pushed to in the 90 days before the fetch.
    pub recently_active_repos: u32,
    pub account_created_at: Option<DateTime<Utc>>,
}
