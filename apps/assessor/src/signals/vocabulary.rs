use serde::{Deserialize, Serialize};

/// Word lists the signal extractor matches against. Every entry may be a
/// single word or a multi-word phrase; matching is case-insensitive and
/// token-aligned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub technical_terms: Vec<String>,
    pub hedge_words: Vec<String>,
    pub quantifier_words: Vec<String>,
    pub credential_words: Vec<String>,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    /// Connectives that mark step-by-step or causal reasoning.
    pub reasoning_markers: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            technical_terms: owned(&[
                "algorithm", "api", "architecture", "asynchronous", "aws", "azure", "backend",
                "benchmark", "c#", "c++", "cache", "caching", "ci/cd", "cloud", "concurrency",
                "container", "database", "debugging", "deployment", "distributed", "django",
                "docker", "encryption", "fastapi", "flask", "frontend", "gcp", "git", "go",
                "golang", "graphql", "index", "java", "javascript", "kafka", "kotlin",
                "kubernetes", "latency", "load balancer", "machine learning", "microservice",
                "microservices", "migration", "mongodb", "node.js", "optimization", "pandas",
                "pipeline", "postgresql", "profiling", "python", "pytorch", "queue", "react",
                "redis", "refactoring", "replication", "rest", "rust", "scalability", "schema",
                "sharding", "sql", "swift", "tensorflow", "terraform", "throughput",
                "typescript", "unit test", "unit tests",
            ]),
            hedge_words: owned(&[
                "maybe", "perhaps", "probably", "possibly", "somewhat", "kind of", "sort of",
                "i think", "i guess", "not sure", "might", "basically", "stuff", "things",
                "etc", "whatever", "something like",
            ]),
            quantifier_words: owned(&[
                "percent", "times", "million", "millions", "thousand", "thousands",
                "hundred", "hundreds", "dozens", "doubled", "tripled", "halved", "reduced",
                "increased",
            ]),
            credential_words: owned(&[
                "certified", "certification", "certificate", "degree", "bachelor", "bachelors",
                "master", "masters", "phd", "b.sc", "m.sc", "b.tech", "m.tech", "mba",
                "diploma",
            ]),
            positive_words: owned(&[
                "excited", "passionate", "love", "enjoy", "motivated", "eager", "interested",
                "thrilled", "proud", "inspired", "grow", "learn", "curious", "impact",
                "believe", "admire",
            ]),
            negative_words: owned(&[
                "bored", "hate", "frustrated", "tired", "forced", "unhappy", "toxic",
                "desperate", "just need", "only for", "don't care",
            ]),
            reasoning_markers: owned(&[
                "first", "second", "then", "because", "therefore", "finally", "as a result",
                "so that", "trade-off", "tradeoff", "instead", "which meant",
            ]),
        }
    }
}

/// Token-aligned phrase matcher over a lowercase vocabulary.
#[derive(Debug, Clone, Default)]
pub(crate) struct PhraseSet {
    phrases: Vec<Vec<String>>,
}

impl PhraseSet {
    pub(crate) fn new(entries: &[String]) -> Self {
        let mut phrases: Vec<Vec<String>> = entries
            .iter()
            .map(|e| tokenize(e))
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort();
        phrases.dedup();
        Self { phrases }
    }

    /// Every phrase occurrence in `tokens`, as (phrase text, position).
    pub(crate) fn find_all(&self, tokens: &[String]) -> Vec<(String, usize)> {
        let mut hits = Vec::new();
        for i in 0..tokens.len() {
            for phrase in &self.phrases {
                let end = i + phrase.len();
                if end <= tokens.len() && tokens[i..end] == phrase[..] {
                    hits.push((phrase.join(" "), i));
                }
            }
        }
        hits
    }

    pub(crate) fn count(&self, tokens: &[String]) -> usize {
        self.find_all(tokens).len()
    }
}

/// Lowercases and splits text into word tokens, keeping characters that
/// belong to technology names (`c++`, `c#`, `node.js`, `ci/cd`).
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\''))
        .map(|w| w.trim_matches(|c: char| c == '.' || c == '-' || c == '*' || c == '•'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_tech_names() {
        assert_eq!(
            tokenize("Built APIs in C++, C# and Node.js (CI/CD)."),
            vec!["built", "apis", "in", "c++", "c#", "and", "node.js", "ci/cd"]
        );
    }

    #[test]
    fn test_phrase_set_matches_multi_word_entries() {
        let set = PhraseSet::new(&owned(&["kind of", "maybe"]));
        let tokens = tokenize("Maybe it was kind of slow, kind of.");
        assert_eq!(set.count(&tokens), 3);
    }

    #[test]
    fn test_phrase_set_dedups_entries() {
        let set = PhraseSet::new(&owned(&["Rust", "rust", " rust "]));
        assert_eq!(set.count(&tokenize("rust")), 1);
    }
}
