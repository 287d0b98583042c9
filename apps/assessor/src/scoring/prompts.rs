// Prompts for the holistic review that may be blended into the local score.

pub const REVIEW_PROMPT: &str = r#"Review this candidate for the role below and judge overall fit.

JOB:
{job}

PROFILE ASSESSMENT (computed locally):
{assessment}

LOCAL DIMENSION SCORES:
{subscores}

INTERVIEW TRANSCRIPT:
{transcript}

Check whether the resume, the third-party profile findings and the interview answers
tell a consistent story. {fairness}

Return exactly this JSON object:
{
  "fit_score": <number 0.0-1.0, overall fit for this role>,
  "consistency_score": <number 0.0-1.0, how consistent the sources are>,
  "insights": ["<short evidence-based observation>", ...],
  "red_flags": ["<short concern>", ...]
}"#;
