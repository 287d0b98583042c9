use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerConfig;
use crate::enrichment::EnrichmentConfig;
use crate::interview::InterviewConfig;
use crate::scoring::ScoringConfig;
use crate::signals::SignalConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Absent means every score goes through the local fallback path.
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    /// Absent means every job resolves to the generic requirement.
    pub job_source_url: Option<String>,
    pub job_cache_ttl_secs: u64,
    pub professional_network_url: Option<String>,
    pub professional_network_key: Option<String>,
    pub code_hosting_api_url: String,
    pub assessment_config_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_api_key: optional_env("LLM_API_KEY"),
            llm_api_url: optional_env("LLM_API_URL")
                .unwrap_or_else(|| crate::llm_client::DEFAULT_API_URL.to_string()),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| crate::llm_client::DEFAULT_MODEL.to_string()),
            job_source_url: optional_env("JOB_SOURCE_URL"),
            job_cache_ttl_secs: optional_env("JOB_CACHE_TTL_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("JOB_CACHE_TTL_SECS must be a whole number of seconds")?
                .unwrap_or(3600),
            professional_network_url: optional_env("PROFESSIONAL_NETWORK_URL"),
            professional_network_key: optional_env("PROFESSIONAL_NETWORK_KEY"),
            code_hosting_api_url: optional_env("CODE_HOSTING_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            assessment_config_path: optional_env("ASSESSMENT_CONFIG_PATH"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline tunables
// ────────────────────────────────────────────────────────────────────────────

/// Every tunable of the assessment pipeline, passed into each component at
/// construction. Missing sections and fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub signals: SignalConfig,
    pub analyzer: AnalyzerConfig,
    pub enrichment: EnrichmentConfig,
    pub interview: InterviewConfig,
    pub scoring: ScoringConfig,
}

impl PipelineConfig {
    /// Reads `path` when given, otherwise the defaults. Always validated.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read assessment config '{path}'"))?;
                serde_json::from_str::<PipelineConfig>(&raw)
                    .with_context(|| format!("Assessment config '{path}' is not valid JSON"))?
            }
            None => PipelineConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.signals.technical_terms.is_empty() {
            bail!("signals: technical vocabulary is empty");
        }
        let sections = [
            ("analyzer", self.analyzer.validate()),
            ("enrichment", self.enrichment.validate()),
            ("interview", self.interview.validate()),
            ("scoring", self.scoring.validate()),
        ];
        for (name, result) in sections {
            if let Err(msg) = result {
                bail!("{name}: {msg}");
            }
        }
        Ok(())
    }
}
