//! Optional phrasing augmentation. A phraser only ever returns new wording
//! for a question the planner already chose; it has no access to the plan's
//! categories or counts.

use async_trait::async_trait;

use crate::interview::planner::QuestionPrompt;
use crate::interview::prompts::{REPHRASE_PROMPT, REPHRASE_SYSTEM};
use crate::llm_client::prompts::fill;
use crate::llm_client::{LlmClient, LlmError};

/// Upper bound on reworded question length, in characters.
const MAX_PHRASED_CHARS: usize = 400;

#[async_trait]
pub trait QuestionPhraser: Send + Sync {
    async fn rephrase(&self, prompt: &QuestionPrompt, role: &str) -> Result<String, LlmError>;
}

pub struct LlmQuestionPhraser(pub LlmClient);

#[async_trait]
impl QuestionPhraser for LlmQuestionPhraser {
    async fn rephrase(&self, prompt: &QuestionPrompt, role: &str) -> Result<String, LlmError> {
        let category = prompt.category.to_string();
        let request = fill(
            REPHRASE_PROMPT,
            &[
                ("role", role),
                ("category", &category),
                ("focus", &prompt.focus),
                ("question", &prompt.text),
            ],
        );
        let text = self.0.call_text(&request, REPHRASE_SYSTEM).await?;
        validate_phrasing(&text)
    }
}

pub(crate) fn validate_phrasing(text: &str) -> Result<String, LlmError> {
    let text = text.trim().trim_matches('"').trim();
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    if text.chars().count() > MAX_PHRASED_CHARS {
        return Err(LlmError::Malformed("reworded question is too long".to_string()));
    }
    if text.matches('?').count() > 2 {
        return Err(LlmError::Malformed("reworded text asks several questions".to_string()));
    }
    Ok(text.to_string())
}
