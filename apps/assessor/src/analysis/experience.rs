use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::SeniorityLevel;

static YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:over\s+|more\s+than\s+)?(\d{1,2})\+?\s*(?:years?|yrs?)\s+(?:of\s+)?(?:professional\s+|industry\s+|hands-on\s+|software\s+)?(?:experience|exp)\b",
    )
    .expect("years pattern is valid")
});

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(senior|sr\.?|lead|principal|staff|junior|jr\.?|intern|trainee|graduate)\s+(?:[a-z+#./-]+\s+){0,2}?(engineer|developer|scientist|analyst|architect|consultant|programmer)\b",
    )
    .expect("title pattern is valid")
});

static MANAGEMENT_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(engineering\s+manager|director\s+of|head\s+of|vice\s+president|vp\s+of|cto)\b")
        .expect("management title pattern is valid")
});

static TEAM_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:led|lead|leading|managed|managing|mentored|mentoring|supervised|headed)\s+(?:a\s+|an\s+)?(?:(?:team|group)\s+of\s+)?(\d{1,3})\b",
    )
    .expect("team size pattern is valid")
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorSource {
    ResumeYears,
    DeclaredYears,
    TitleKeyword,
    TeamSize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelIndicator {
    pub source: IndicatorSource,
    pub level: SeniorityLevel,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceEstimate {
    pub level: SeniorityLevel,
    /// Set when fewer than two indicators back the chosen level, or when
    /// indicators disagree.
    pub low_confidence: bool,
    /// Largest years-of-experience figure found (resume or declared).
    pub years: Option<u32>,
    pub indicators: Vec<LevelIndicator>,
}

fn level_for_years(years: u32) -> SeniorityLevel {
    match years {
        0 => SeniorityLevel::Intern,
        1..=2 => SeniorityLevel::Junior,
        3..=5 => SeniorityLevel::Mid,
        6..=9 => SeniorityLevel::Senior,
        _ => SeniorityLevel::Lead,
    }
}

fn level_for_title(word: &str) -> SeniorityLevel {
    match word.trim_end_matches('.').to_lowercase().as_str() {
        "senior" | "sr" => SeniorityLevel::Senior,
        "lead" | "principal" | "staff" => SeniorityLevel::Lead,
        "junior" | "jr" | "graduate" => SeniorityLevel::Junior,
        "intern" | "trainee" => SeniorityLevel::Intern,
        _ => SeniorityLevel::Mid,
    }
}

fn level_for_team_size(size: u32) -> SeniorityLevel {
    match size {
        0..=2 => SeniorityLevel::Senior,
        3..=7 => SeniorityLevel::Lead,
        _ => SeniorityLevel::Management,
    }
}

/// Collects independent seniority indicators from the resume and the
/// candidate's declared years.
pub fn collect_indicators(resume: &str, declared_years: Option<u32>) -> Vec<LevelIndicator> {
    let mut indicators = Vec::new();

    let resume_years = YEARS_RE
        .captures_iter(resume)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .max();
    if let Some(years) = resume_years {
        indicators.push(LevelIndicator {
            source: IndicatorSource::ResumeYears,
            level: level_for_years(years),
            evidence: format!("{years} years of experience"),
        });
    }

    if let Some(years) = declared_years {
        indicators.push(LevelIndicator {
            source: IndicatorSource::DeclaredYears,
            level: level_for_years(years),
            evidence: format!("declared {years} years"),
        });
    }

    let title = MANAGEMENT_TITLE_RE
        .find_iter(resume)
        .map(|m| (SeniorityLevel::Management, m.as_str().to_string()))
        .chain(TITLE_RE.captures_iter(resume).filter_map(|c| {
            let whole = c.get(0)?.as_str().to_string();
            Some((level_for_title(c.get(1)?.as_str()), whole))
        }))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));
    if let Some((level, evidence)) = title {
        indicators.push(LevelIndicator {
            source: IndicatorSource::TitleKeyword,
            level,
            evidence,
        });
    }

    let team = TEAM_SIZE_RE
        .captures_iter(resume)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .max();
    if let Some(size) = team {
        indicators.push(LevelIndicator {
            source: IndicatorSource::TeamSize,
            level: level_for_team_size(size),
            evidence: format!("led a team of {size}"),
        });
    }

    indicators
}

/// Resolves indicators to one level. The highest level wins only when at
/// least two indicators sit at or above it; otherwise the highest level that
/// two indicators do support is kept and the estimate is marked
/// low-confidence.
pub fn estimate_experience(resume: &str, declared_years: Option<u32>) -> ExperienceEstimate {
    let indicators = collect_indicators(resume, declared_years);
    let years = indicators
        .iter()
        .filter(|i| matches!(i.source, IndicatorSource::ResumeYears | IndicatorSource::DeclaredYears))
        .filter_map(|i| i.evidence.split_whitespace().find_map(|w| w.parse::<u32>().ok()))
        .max();

    let mut levels: Vec<SeniorityLevel> = indicators.iter().map(|i| i.level).collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));

    let (level, low_confidence) = match levels.as_slice() {
        [] => (SeniorityLevel::Junior, true),
        [only] => (*only, true),
        [highest, second, ..] if highest == second => (*highest, false),
        // Sorted descending, so the second entry is the highest level that
        // two indicators reach.
        [_, second, ..] => (*second, true),
    };

    ExperienceEstimate {
        level,
        low_confidence,
        years,
        indicators,
    }
}
