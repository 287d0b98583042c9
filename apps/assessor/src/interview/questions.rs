use crate::interview::plan::{PlanContext, PlannedSlot, SlotKind};
use crate::interview::{QuestionCategory, EVASIVE_ANSWER, VAGUE_ANSWER};

/// Refers to a technology that does not exist. A confident, detailed answer
/// means the candidate is bluffing.
pub const INTEGRITY_QUESTION: &str = "When configuring ElasticCacheX Timed Graph Layer for \
Kubernetes autoscaling, which metrics mattered most to you and why?";

const FOCUS_TEMPLATES: &[(&str, &str)] = &[
    (
        "core_skills",
        "Walk me through a recent project where you relied heavily on {skill}. What were the \
         hardest technical problems and how did you solve them?",
    ),
    (
        "mandatory_skill_validation",
        "This {role} role needs strong {missing_skill}. Describe the most complex thing you have \
         built with it, or how you would get productive with it quickly.",
    ),
    (
        "architecture_design",
        "How would you design a system that must handle ten times today's traffic? Explain the \
         components you would choose and the trade-offs involved.",
    ),
    (
        "project_examples",
        "Tell me about a project you are proud of. What was your specific role, and what \
         measurable outcome did it have?",
    ),
    (
        "leadership_examples",
        "Describe a time you led or mentored other engineers. How did you handle disagreement \
         within the team?",
    ),
    (
        "scale_validation",
        "Your resume mentions results at scale. Pick one and explain how it was measured and what \
         you changed to get there.",
    ),
    (
        "discrepancy_probe",
        "Some details across your profiles do not line up ({flag}). Can you walk me through your \
         recent roles and what you worked on in each?",
    ),
    (
        "company_interest",
        "What draws you to {company} and to this {role} position in particular?",
    ),
    (
        "career_goals",
        "Where do you want your career to be in three years, and how does this role fit into that?",
    ),
    (
        "problem_solving",
        "Describe a difficult bug or outage you worked on. How did you narrow down the cause?",
    ),
    (
        "communication_style",
        "How do you explain a technical decision to someone without a technical background? Give a \
         recent example.",
    ),
    (
        "values_alignment",
        "What kind of engineering culture brings out your best work, and what have you done to \
         help build it?",
    ),
    (
        "team_collaboration",
        "Tell me about a time you disagreed with a teammate on a technical approach. How was it \
         resolved?",
    ),
];

pub fn generic_question(category: QuestionCategory) -> &'static str {
    match category {
        QuestionCategory::TechnicalDepth => {
            "Tell me about the technical work you are most confident in and how you approach \
             learning a new technology."
        }
        QuestionCategory::ExperienceValidation => {
            "Walk me through the experience you consider most relevant to this role."
        }
        QuestionCategory::MotivationAlignment => {
            "What motivates you in your work, and why are you interested in this role?"
        }
        QuestionCategory::BehavioralAssessment => {
            "Describe a challenging situation at work and how you handled it."
        }
        QuestionCategory::CultureFit => "What kind of team environment helps you do your best work?",
    }
}

fn follow_up_question(trigger: Option<&str>) -> &'static str {
    match trigger {
        Some(VAGUE_ANSWER) => {
            "Could you make that more concrete? Pick one specific example and describe exactly \
             what you did and what came of it."
        }
        Some(EVASIVE_ANSWER) => {
            "Could you expand on that a little? I would like to hear a specific example from your \
             own work."
        }
        _ => "Could you tell me more about that, with a specific example?",
    }
}

/// Fills `{name}` placeholders. `None` when a placeholder has no value.
fn render(template: &str, ctx: &PlanContext, slot_ordinal: usize) -> Option<String> {
    let pick = |items: &[String]| -> Option<String> {
        if items.is_empty() {
            None
        } else {
            Some(items[slot_ordinal % items.len()].clone())
        }
    };

    let mut out = template.to_string();
    let substitutions: [(&str, Option<String>); 5] = [
        ("{skill}", pick(&ctx.probe_skills)),
        ("{missing_skill}", pick(&ctx.missing_skills).or_else(|| pick(&ctx.probe_skills))),
        ("{role}", Some(ctx.role.clone()).filter(|r| !r.is_empty())),
        ("{company}", ctx.company.clone()),
        (
            "{flag}",
            ctx.red_flags.first().map(|f| f.kind().replace('_', " ")),
        ),
    ];
    for (placeholder, value) in substitutions {
        if out.contains(placeholder) {
            out = out.replace(placeholder, &value?);
        }
    }
    Some(out)
}

/// Text for a slot. Never fails: unknown focus keys or missing context fall
/// back to the category's generic question.
pub fn question_for(slot: &PlannedSlot, ctx: &PlanContext, slot_ordinal: usize) -> String {
    match slot.kind {
        SlotKind::IntegrityCheck => INTEGRITY_QUESTION.to_string(),
        SlotKind::FollowUp => follow_up_question(slot.trigger.as_deref()).to_string(),
        SlotKind::Planned => FOCUS_TEMPLATES
            .iter()
            .find(|(focus, _)| *focus == slot.focus)
            .and_then(|(_, template)| render(template, ctx, slot_ordinal))
            .unwrap_or_else(|| generic_question(slot.category).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RedFlag;

    fn slot(category: QuestionCategory, focus: &str) -> PlannedSlot {
        PlannedSlot {
            category,
            focus: focus.to_string(),
            kind: SlotKind::Planned,
            question: None,
            answered: false,
            trigger: None,
        }
    }

    fn ctx() -> PlanContext {
        PlanContext {
            role: "Backend Engineer".to_string(),
            company: Some("Acme".to_string()),
            probe_skills: vec!["rust".to_string(), "sql".to_string()],
            missing_skills: vec![],
            red_flags: vec![RedFlag("employer_mismatch:a|b".to_string())],
        }
    }

    #[test]
    fn test_templates_fill_placeholders() {
        let q = question_for(&slot(QuestionCategory::TechnicalDepth, "core_skills"), &ctx(), 1);
        assert!(q.contains("sql"), "{q}");
        let q = question_for(&slot(QuestionCategory::MotivationAlignment, "company_interest"), &ctx(), 0);
        assert!(q.contains("Acme") && q.contains("Backend Engineer"), "{q}");
        let q = question_for(&slot(QuestionCategory::ExperienceValidation, "discrepancy_probe"), &ctx(), 0);
        assert!(q.contains("employer mismatch"), "{q}");
    }

    #[test]
    fn test_missing_context_falls_back_to_generic() {
        let empty = PlanContext::default();
        let q = question_for(&slot(QuestionCategory::MotivationAlignment, "company_interest"), &empty, 0);
        assert_eq!(q, generic_question(QuestionCategory::MotivationAlignment));
    }

    #[test]
    fn test_unknown_focus_falls_back_to_generic() {
        let q = question_for(&slot(QuestionCategory::CultureFit, "no_such_focus"), &ctx(), 0);
        assert_eq!(q, generic_question(QuestionCategory::CultureFit));
    }

    #[test]
    fn test_integrity_slot_uses_probe_question() {
        let mut s = slot(QuestionCategory::TechnicalDepth, "integrity_check");
        s.kind = SlotKind::IntegrityCheck;
        assert_eq!(question_for(&s, &ctx(), 0), INTEGRITY_QUESTION);
    }

    #[test]
    fn test_missing_skill_falls_back_to_probe_skill() {
        let q = question_for(
            &slot(QuestionCategory::TechnicalDepth, "mandatory_skill_validation"),
            &ctx(),
            0,
        );
        assert!(q.contains("strong rust"), "{q}");
    }
}
