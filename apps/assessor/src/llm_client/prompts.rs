// Cross-cutting prompt fragments. Each component that calls the model keeps
// its own prompts.rs next to it.

/// System prompt for calls that must return a single JSON object.
pub const JSON_ONLY_SYSTEM: &str = "You are a careful hiring analyst. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Appended to every prompt that includes candidate data.
pub const FAIRNESS_INSTRUCTION: &str = "\
    Judge only job-relevant evidence. Ignore name, gender, age, nationality and any \
    other protected attribute. If the evidence is thin, say so rather than guessing.";

/// Replaces `{key}` placeholders in a prompt template.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
