//! Third-party profile enrichment: per-candidate stage machine, fetchers and
//! the orchestrator that drives fetch attempts with backoff.

pub mod fetchers;
pub mod orchestrator;
pub mod rate_limit;
pub mod state;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fetchers::{CodeHostingFetcher, ProfessionalNetworkFetcher, ProfileFetcher};
pub use orchestrator::{EnrichmentError, EnrichmentOrchestrator};
pub use rate_limit::RateLimiter;
pub use state::{EnrichmentProgress, EnrichmentStage, EnrichmentState};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Fetch attempts before the stage becomes `failed`.
    pub max_attempts: u32,
    /// Delay before attempt N is `backoff_secs[N - 1]`; the last entry repeats.
    pub backoff_secs: Vec<u64>,
    /// Candidates fetched at the same time.
    pub concurrency_limit: usize,
    /// Minimum gap between two requests to any third-party source.
    pub min_request_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: vec![0, 2, 10],
            concurrency_limit: 8,
            min_request_interval_ms: 250,
            request_timeout_secs: 20,
        }
    }
}

impl EnrichmentConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("enrichment.max_attempts must be at least 1".to_string());
        }
        if self.backoff_secs.is_empty() {
            return Err("enrichment.backoff_secs must not be empty".to_string());
        }
        if self.backoff_secs.windows(2).any(|w| w[0] > w[1]) {
            return Err("enrichment.backoff_secs must be non-decreasing".to_string());
        }
        if self.concurrency_limit == 0 {
            return Err("enrichment.concurrency_limit must be at least 1".to_string());
        }
        Ok(())
    }

    /// Delay before the given 1-based attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let idx = (attempt.saturating_sub(1) as usize).min(self.backoff_secs.len().saturating_sub(1));
        Duration::from_secs(self.backoff_secs.get(idx).copied().unwrap_or(0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fetch errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("invalid profile link: {0}")]
    InvalidUrl(String),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("source is not configured")]
    NotConfigured,
}

impl FetchError {
    /// Permanent failures are not retried for that source.
    pub fn is_permanent(&self) -> bool {
        match self {
            FetchError::NotFound(_) | FetchError::InvalidUrl(_) | FetchError::NotConfigured => true,
            FetchError::Status { status } => {
                (400..500).contains(status) && *status != 403 && *status != 408 && *status != 429
            }
            FetchError::Http(_) | FetchError::Payload(_) => false,
        }
    }
}
