use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Ordinal seniority scale. Declaration order is the ordering used for
/// comparisons, so `Intern < Junior < ... < Management`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Intern,
    Junior,
    Mid,
    Senior,
    Lead,
    Management,
}

impl SeniorityLevel {
    pub fn rank(self) -> i32 {
        self as i32
    }

    /// Maps a role title (and optionally its description) to a level by
    /// keyword. Falls back to `Mid` when nothing matches.
    pub fn from_role_text(title: &str, description: &str) -> Self {
        let title_words = words(title);
        if let Some(level) = level_from_words(&title_words) {
            return level;
        }
        level_from_words(&words(description)).unwrap_or(SeniorityLevel::Mid)
    }
}

const MANAGEMENT_WORDS: &[&str] = &["manager", "director", "head", "vp", "cto"];
const LEAD_WORDS: &[&str] = &["lead", "principal", "staff"];
const SENIOR_WORDS: &[&str] = &["senior", "sr", "architect"];
const JUNIOR_WORDS: &[&str] = &["junior", "jr", "entry", "associate", "trainee", "graduate"];
const INTERN_WORDS: &[&str] = &["intern", "internship"];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn level_from_words(words: &[String]) -> Option<SeniorityLevel> {
    let has = |set: &[&str]| words.iter().any(|w| set.contains(&w.as_str()));
    if has(MANAGEMENT_WORDS) {
        Some(SeniorityLevel::Management)
    } else if has(LEAD_WORDS) {
        Some(SeniorityLevel::Lead)
    } else if has(SENIOR_WORDS) {
        Some(SeniorityLevel::Senior)
    } else if has(INTERN_WORDS) {
        Some(SeniorityLevel::Intern)
    } else if has(JUNIOR_WORDS) {
        Some(SeniorityLevel::Junior)
    } else {
        None
    }
}

/// Technical focus tags and the keywords that signal each of them.
pub const TECHNICAL_FOCUS_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "machine_learning",
        &["machine learning", "ml", "ai", "deep learning", "pytorch", "tensorflow"],
    ),
    (
        "web_development",
        &["web", "frontend", "backend", "full stack", "react", "django", "node.js"],
    ),
    ("data_science", &["data science", "analytics", "pandas", "statistics"]),
    ("devops", &["devops", "kubernetes", "docker", "terraform", "ci/cd", "aws"]),
    ("mobile", &["mobile", "ios", "android", "flutter", "react native"]),
    ("security", &["security", "cybersecurity", "penetration", "encryption"]),
    ("database", &["database", "sql", "postgresql", "mongodb", "redis"]),
];

pub fn focus_keywords(tag: &str) -> &'static [&'static str] {
    TECHNICAL_FOCUS_KEYWORDS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, kws)| *kws)
        .unwrap_or(&[])
}

/// True when `text` mentions `keyword` as a whole word or phrase.
pub fn mentions(text: &str, keyword: &str) -> bool {
    let haystack = format!(" {} ", normalize_phrase(text));
    let needle = format!(" {} ", normalize_phrase(keyword));
    haystack.contains(&needle)
}

fn normalize_phrase(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '/')))
        .map(|w| w.trim_end_matches('.'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives technical focus tags from a free-text job description.
pub fn detect_technical_focus(text: &str) -> BTreeSet<String> {
    TECHNICAL_FOCUS_KEYWORDS
        .iter()
        .filter(|(_, kws)| kws.iter().any(|kw| mentions(text, kw)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

/// What a job asks for. Read-only input to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRequirement {
    pub job_id: Option<i64>,
    pub title: String,
    pub company_name: Option<String>,
    pub mandatory_skills: BTreeSet<String>,
    pub preferred_skills: BTreeSet<String>,
    pub seniority: SeniorityLevel,
    pub technical_focus: BTreeSet<String>,
    pub industry: String,
}

impl JobRequirement {
    /// Requirement used when the job source has nothing for a job id.
    pub fn generic() -> Self {
        Self {
            job_id: None,
            title: "Software Engineer".to_string(),
            company_name: None,
            mandatory_skills: BTreeSet::new(),
            preferred_skills: BTreeSet::new(),
            seniority: SeniorityLevel::Mid,
            technical_focus: BTreeSet::new(),
            industry: "technology".to_string(),
        }
    }
}
