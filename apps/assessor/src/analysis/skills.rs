use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::JobRequirement;

/// Case-insensitive skill canonicalizer with an alias table
/// (`"k8s" -> "kubernetes"`).
#[derive(Debug, Clone, Default)]
pub struct SkillMatcher {
    aliases: BTreeMap<String, String>,
}

impl SkillMatcher {
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        let aliases = aliases
            .iter()
            .map(|(from, to)| (normalize(from), normalize(to)))
            .filter(|(from, to)| !from.is_empty() && !to.is_empty())
            .collect();
        Self { aliases }
    }

    pub fn canonical(&self, skill: &str) -> String {
        let key = normalize(skill);
        self.aliases.get(&key).cloned().unwrap_or(key)
    }

    pub fn canonical_set<'a, I>(&self, skills: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        skills
            .into_iter()
            .map(|s| self.canonical(s))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn normalize(skill: &str) -> String {
    skill
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Match result for one requirement tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TierMatch {
    pub hits: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    /// `hits / required`; `None` when the tier lists no skills.
    pub ratio: Option<f64>,
}

impl TierMatch {
    fn compute(required: &BTreeSet<String>, have: &BTreeSet<String>) -> Self {
        let hits: BTreeSet<String> = required.intersection(have).cloned().collect();
        let missing: BTreeSet<String> = required.difference(have).cloned().collect();
        let ratio = if required.is_empty() {
            None
        } else {
            Some(hits.len() as f64 / required.len() as f64)
        };
        Self {
            hits,
            missing,
            ratio,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillMatch {
    pub mandatory: TierMatch,
    pub preferred: TierMatch,
    /// Canonical declared skills.
    pub declared: BTreeSet<String>,
    /// Canonical skills detected from code-hosting activity.
    pub code_derived: BTreeSet<String>,
    /// Declared skills that code activity backs up.
    pub corroborated: BTreeSet<String>,
}

impl SkillMatch {
    pub fn all_skills(&self) -> BTreeSet<String> {
        self.declared.union(&self.code_derived).cloned().collect()
    }
}

pub fn match_skills(
    matcher: &SkillMatcher,
    declared: &[String],
    code_derived: Option<&BTreeSet<String>>,
    job: &JobRequirement,
) -> SkillMatch {
    let declared = matcher.canonical_set(declared);
    let code_derived = code_derived
        .map(|skills| matcher.canonical_set(skills))
        .unwrap_or_default();
    let have: BTreeSet<String> = declared.union(&code_derived).cloned().collect();

    let mandatory = matcher.canonical_set(&job.mandatory_skills);
    // A skill listed in both tiers only counts as mandatory.
    let preferred: BTreeSet<String> = matcher
        .canonical_set(&job.preferred_skills)
        .difference(&mandatory)
        .cloned()
        .collect();

    SkillMatch {
        mandatory: TierMatch::compute(&mandatory, &have),
        preferred: TierMatch::compute(&preferred, &have),
        corroborated: declared.intersection(&code_derived).cloned().collect(),
        declared,
        code_derived,
    }
}

pub fn default_skill_aliases() -> BTreeMap<String, String> {
    [
        ("js", "javascript"),
        ("ts", "typescript"),
        ("py", "python"),
        ("golang", "go"),
        ("k8s", "kubernetes"),
        ("postgres", "postgresql"),
        ("psql", "postgresql"),
        ("node", "node.js"),
        ("nodejs", "node.js"),
        ("reactjs", "react"),
        ("react.js", "react"),
        ("c sharp", "c#"),
        ("cpp", "c++"),
        ("ml", "machine learning"),
        ("tf", "tensorflow"),
        ("amazon web services", "aws"),
        ("gcp", "google cloud"),
        ("mongo", "mongodb"),
        ("vue.js", "vue"),
        ("vuejs", "vue"),
    ]
    .into_iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}
