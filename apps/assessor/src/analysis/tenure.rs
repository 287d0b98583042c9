use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ProfessionalProfile;

static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|—|to)\s*((?:19|20)\d{2}|present|current|now)\b")
        .expect("year range pattern is valid")
});

/// Positions shorter than this count as short stints.
pub const SHORT_STINT_MONTHS: u32 = 12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenureSource {
    ProfessionalNetwork,
    Resume,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenureProfile {
    pub source: Option<TenureSource>,
    pub positions: usize,
    pub average_tenure_months: Option<f64>,
    pub short_stints: usize,
}

impl TenureProfile {
    fn from_months(source: TenureSource, months: &[u32]) -> Self {
        let average = if months.is_empty() {
            None
        } else {
            Some(months.iter().map(|m| *m as f64).sum::<f64>() / months.len() as f64)
        };
        Self {
            source: Some(source),
            positions: months.len(),
            average_tenure_months: average,
            short_stints: months.iter().filter(|m| **m < SHORT_STINT_MONTHS).count(),
        }
    }

    fn unknown() -> Self {
        Self {
            source: None,
            positions: 0,
            average_tenure_months: None,
            short_stints: 0,
        }
    }
}

/// Tenure pattern from the professional-network employment history when
/// present, otherwise from year ranges written in the resume.
pub fn tenure_profile(
    professional: Option<&ProfessionalProfile>,
    resume: &str,
    as_of: NaiveDate,
) -> TenureProfile {
    if let Some(profile) = professional.filter(|p| !p.employments.is_empty()) {
        let months: Vec<u32> = profile.employments.iter().map(|e| e.months(as_of)).collect();
        return TenureProfile::from_months(TenureSource::ProfessionalNetwork, &months);
    }

    let months: Vec<u32> = YEAR_RANGE_RE
        .captures_iter(resume)
        .filter_map(|c| {
            let start: i32 = c.get(1)?.as_str().parse().ok()?;
            let end = match c.get(2)?.as_str().parse::<i32>() {
                Ok(year) => year,
                Err(_) => as_of.year(),
            };
            if end < start {
                return None;
            }
            // Same-year ranges are counted as half a year.
            Some(if end == start { 6 } else { ((end - start) * 12) as u32 })
        })
        .collect();

    if months.is_empty() {
        TenureProfile::unknown()
    } else {
        TenureProfile::from_months(TenureSource::Resume, &months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employment;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_professional_history_wins() {
        let profile = ProfessionalProfile {
            employments: vec![
                Employment {
                    company: "A".to_string(),
                    title: "Dev".to_string(),
                    start_date: date(2020, 1),
                    end_date: Some(date(2020, 7)),
                },
                Employment {
                    company: "B".to_string(),
                    title: "Dev".to_string(),
                    start_date: date(2020, 7),
                    end_date: None,
                },
            ],
            ..Default::default()
        };
        let t = tenure_profile(Some(&profile), "2010 - 2020", date(2023, 7));
        assert_eq!(t.source, Some(TenureSource::ProfessionalNetwork));
        assert_eq!(t.positions, 2);
        assert_eq!(t.short_stints, 1);
        assert_eq!(t.average_tenure_months, Some(21.0));
    }

    #[test]
    fn test_resume_year_ranges() {
        let resume = "Acme 2015 - 2019\nGlobex 2019 to present\nInitech 2014–2014";
        let t = tenure_profile(None, resume, date(2023, 1));
        assert_eq!(t.source, Some(TenureSource::Resume));
        assert_eq!(t.positions, 3);
        assert_eq!(t.short_stints, 1);
    }

    #[test]
    fn test_no_history_is_unknown() {
        let t = tenure_profile(None, "no dates here", date(2023, 1));
        assert_eq!(t.source, None);
        assert_eq!(t.average_tenure_months, None);
    }
}
