//! Signal extraction: pure text → numeric signals.
//!
//! Every function here is deterministic for a given input and `SignalConfig`
//! and performs no I/O. Empty or whitespace-only input yields a zero bundle.

pub mod vocabulary;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use vocabulary::SignalConfig;
use vocabulary::{tokenize, PhraseSet};

/// Where a text blob came from. Resumes and social bios treat line breaks as
/// sentence boundaries (bullet lists); interview answers do not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalContext {
    Resume,
    InterviewAnswer,
    SocialBio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalBundle {
    pub context: SignalContext,
    pub word_count: usize,
    pub sentence_count: usize,
    /// Unique tokens / total tokens.
    pub lexical_diversity: f64,
    /// Technical vocabulary hits / total tokens, capped at 1.
    pub technical_density: f64,
    /// Distinct technical terms found, sorted.
    pub technical_terms: Vec<String>,
    pub avg_sentence_length: f64,
    /// Numeric tokens plus quantifier words.
    pub quantifier_count: usize,
    /// Quantified sentences share, capped at 1.
    pub quantification: f64,
    /// Hedge words / total tokens.
    pub vagueness: f64,
    /// In [-1, 1]; 0 when no sentiment words occur.
    pub sentiment: f64,
    pub credential_mentions: usize,
    pub reasoning_markers: usize,
}

impl SignalBundle {
    pub fn zero(context: SignalContext) -> Self {
        Self {
            context,
            word_count: 0,
            sentence_count: 0,
            lexical_diversity: 0.0,
            technical_density: 0.0,
            technical_terms: Vec::new(),
            avg_sentence_length: 0.0,
            quantifier_count: 0,
            quantification: 0.0,
            vagueness: 0.0,
            sentiment: 0.0,
            credential_mentions: 0,
            reasoning_markers: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    /// Specificity in [0, 1]: high when the text is not hedged.
    pub fn specificity(&self) -> f64 {
        (1.0 - self.vagueness * 10.0).clamp(0.0, 1.0)
    }
}

/// Compiled vocabulary. Build once per `SignalConfig` and share.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    technical: PhraseSet,
    hedges: PhraseSet,
    quantifiers: PhraseSet,
    credentials: PhraseSet,
    positive: PhraseSet,
    negative: PhraseSet,
    reasoning: PhraseSet,
}

impl SignalExtractor {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            technical: PhraseSet::new(&config.technical_terms),
            hedges: PhraseSet::new(&config.hedge_words),
            quantifiers: PhraseSet::new(&config.quantifier_words),
            credentials: PhraseSet::new(&config.credential_words),
            positive: PhraseSet::new(&config.positive_words),
            negative: PhraseSet::new(&config.negative_words),
            reasoning: PhraseSet::new(&config.reasoning_markers),
        }
    }

    pub fn extract(&self, text: &str, context: SignalContext) -> SignalBundle {
        let sentences = split_sentences(text, context);
        let tokens: Vec<String> = sentences.iter().flat_map(|s| tokenize(s)).collect();
        if tokens.is_empty() {
            return SignalBundle::zero(context);
        }

        let word_count = tokens.len();
        let words = word_count as f64;
        let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();

        let technical_hits = self.technical.find_all(&tokens);
        let technical_terms: BTreeSet<String> =
            technical_hits.iter().map(|(term, _)| term.clone()).collect();

        let mut quantifier_count = 0;
        let mut quantified_sentences = 0;
        for sentence in &sentences {
            let sentence_tokens = tokenize(sentence);
            let numeric = sentence_tokens.iter().filter(|t| is_numeric(t)).count();
            let n = numeric + self.quantifiers.count(&sentence_tokens);
            quantifier_count += n;
            if n > 0 {
                quantified_sentences += 1;
            }
        }
        let sentence_count = sentences.len().max(1);

        let positive = self.positive.count(&tokens) as f64;
        let negative = self.negative.count(&tokens) as f64;
        let sentiment = if positive + negative > 0.0 {
            (positive - negative) / (positive + negative)
        } else {
            0.0
        };

        SignalBundle {
            context,
            word_count,
            sentence_count,
            lexical_diversity: unique.len() as f64 / words,
            technical_density: (technical_hits.len() as f64 / words).min(1.0),
            technical_terms: technical_terms.into_iter().collect(),
            avg_sentence_length: words / sentence_count as f64,
            quantifier_count,
            quantification: (quantified_sentences as f64 / sentence_count as f64).min(1.0),
            vagueness: self.hedges.count(&tokens) as f64 / words,
            sentiment,
            credential_mentions: self.credentials.count(&tokens),
            reasoning_markers: self.reasoning.count(&tokens),
        }
    }
}

fn is_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

fn split_sentences(text: &str, context: SignalContext) -> Vec<String> {
    let line_breaks = matches!(context, SignalContext::Resume | SignalContext::SocialBio);
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let boundary = match c {
            '!' | '?' => true,
            // "node.js" and "3.5" keep their dot.
            '.' => chars.peek().map_or(true, |next| next.is_whitespace()),
            '\n' => line_breaks,
            _ => false,
        };
        if boundary {
            if c != '\n' {
                current.push(c);
            }
            push_sentence(&mut sentences, &mut current);
        } else {
            current.push(if c == '\n' { ' ' } else { c });
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !tokenize(trimmed).is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SignalExtractor {
        SignalExtractor::new(&SignalConfig::default())
    }

    #[test]
    fn test_empty_input_yields_zero_bundle() {
        let ex = extractor();
        assert_eq!(
            ex.extract("", SignalContext::Resume),
            SignalBundle::zero(SignalContext::Resume)
        );
        assert!(ex.extract("  \n\t ", SignalContext::InterviewAnswer).is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let ex = extractor();
        let text = "I migrated our Django API to Kubernetes. Latency dropped by 40 percent.";
        assert_eq!(
            ex.extract(text, SignalContext::InterviewAnswer),
            ex.extract(text, SignalContext::InterviewAnswer)
        );
    }

    #[test]
    fn test_technical_density_and_terms() {
        let b = extractor().extract(
            "Python and Redis and Kafka and Docker",
            SignalContext::InterviewAnswer,
        );
        assert_eq!(b.word_count, 7);
        assert_eq!(b.technical_terms, vec!["docker", "kafka", "python", "redis"]);
        assert!((b.technical_density - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_vagueness_counts_hedges() {
        let b = extractor().extract(
            "Maybe I did some stuff, not sure really",
            SignalContext::InterviewAnswer,
        );
        // maybe, stuff, not sure over 8 tokens
        assert!((b.vagueness - 3.0 / 8.0).abs() < 1e-9, "got {}", b.vagueness);
        assert!(b.specificity() < 0.01);
    }

    #[test]
    fn test_quantification_uses_numbers_and_words() {
        let b = extractor().extract(
            "Cut costs by 30%. Served millions of users. Wrote docs.",
            SignalContext::InterviewAnswer,
        );
        assert_eq!(b.sentence_count, 3);
        assert_eq!(b.quantifier_count, 2);
        assert!((b.quantification - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_resume_lines_are_sentences_but_answers_are_not() {
        let ex = extractor();
        let text = "Senior engineer at Acme\nLed a team of 5";
        assert_eq!(ex.extract(text, SignalContext::Resume).sentence_count, 2);
        assert_eq!(ex.extract(text, SignalContext::InterviewAnswer).sentence_count, 1);
    }

    #[test]
    fn test_dotted_names_do_not_split_sentences() {
        let b = extractor().extract("Built it in Node.js and shipped v2.5 fast.", SignalContext::InterviewAnswer);
        assert_eq!(b.sentence_count, 1);
        assert!(b.technical_terms.contains(&"node.js".to_string()));
    }

    #[test]
    fn test_sentiment_balance() {
        let ex = extractor();
        let positive = ex.extract("I am excited and eager to learn", SignalContext::InterviewAnswer);
        assert!((positive.sentiment - 1.0).abs() < 1e-9);
        let mixed = ex.extract("I love the work but hate the commute", SignalContext::InterviewAnswer);
        assert!(mixed.sentiment.abs() < 1e-9);
    }

    #[test]
    fn test_credentials_and_reasoning() {
        let b = extractor().extract(
            "I hold a Masters degree. First we profiled, then we fixed it because it was slow.",
            SignalContext::InterviewAnswer,
        );
        assert_eq!(b.credential_mentions, 2);
        assert_eq!(b.reasoning_markers, 3);
    }
}
