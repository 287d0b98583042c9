//! Third-party profile fetchers. Each returns a structured payload or a
//! `FetchError`; the orchestrator decides whether to retry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::enrichment::{FetchError, RateLimiter};
use crate::models::{CodeHostingProfile, DataSource, ProfessionalProfile};

const USER_AGENT: &str = concat!("assessor/", env!("CARGO_PKG_VERSION"));

/// Repositories pushed to within this window count as recently active.
const RECENT_ACTIVITY_DAYS: i64 = 90;

/// Path segments under the code-hosting domain that are not user handles.
const RESERVED_PATHS: &[&str] = &[
    "orgs",
    "organizations",
    "explore",
    "marketplace",
    "pricing",
    "features",
];

/// Skills implied by a repository's primary language.
const LANGUAGE_SKILLS: &[(&str, &[&str])] = &[
    ("python", &["python"]),
    ("javascript", &["javascript", "nodejs"]),
    ("typescript", &["typescript", "javascript"]),
    ("java", &["java"]),
    ("go", &["go"]),
    ("rust", &["rust"]),
    ("c++", &["c++"]),
    ("c#", &["c#", "dotnet"]),
    ("php", &["php"]),
    ("ruby", &["ruby"]),
    ("swift", &["swift", "ios"]),
    ("kotlin", &["kotlin", "android"]),
    ("scala", &["scala"]),
    ("html", &["html", "css"]),
    ("css", &["css"]),
];

#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    type Payload: Send;

    fn source(&self) -> DataSource;

    async fn fetch(&self, url: &str) -> Result<Self::Payload, FetchError>;
}

fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Ok(Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?)
}

/// Parses a link that may lack a scheme.
fn parse_link(url: &str) -> Result<Url, FetchError> {
    let trimmed = url.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    Url::parse(&with_scheme).map_err(|e| FetchError::InvalidUrl(format!("{trimmed}: {e}")))
}

fn host_matches(url: &Url, domain: &str) -> bool {
    url.host_str()
        .map(|h| h == domain || h.ends_with(&format!(".{domain}")))
        .unwrap_or(false)
}

fn valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle.len() <= 100
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ────────────────────────────────────────────────────────────────────────────
// Professional network
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the public handle from a `linkedin.com/in/<handle>` link.
pub fn professional_handle(url: &str) -> Result<String, FetchError> {
    let parsed = parse_link(url)?;
    if !host_matches(&parsed, "linkedin.com") {
        return Err(FetchError::InvalidUrl(format!("{url} is not a professional-network profile")));
    }
    let mut segments = parsed.path_segments().into_iter().flatten().filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("in"), Some(handle)) if valid_handle(handle) => Ok(handle.to_string()),
        _ => Err(FetchError::InvalidUrl(format!("{url} does not point at a member profile"))),
    }
}

/// Looks profiles up through a scraping service that returns the
/// `ProfessionalProfile` JSON shape.
pub struct ProfessionalNetworkFetcher {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl ProfessionalNetworkFetcher {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        limiter: Arc<RateLimiter>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_key,
            limiter,
        })
    }
}

#[async_trait]
impl ProfileFetcher for ProfessionalNetworkFetcher {
    type Payload = ProfessionalProfile;

    fn source(&self) -> DataSource {
        DataSource::ProfessionalNetwork
    }

    async fn fetch(&self, url: &str) -> Result<ProfessionalProfile, FetchError> {
        let base = self.base_url.as_deref().ok_or(FetchError::NotConfigured)?;
        let handle = professional_handle(url)?;

        self.limiter.wait().await;
        let mut request = self
            .client
            .post(format!("{base}/profiles/lookup"))
            .json(&json!({ "handle": handle, "url": url }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(handle)),
            s if !s.is_success() => {
                warn!(status = s.as_u16(), %handle, "professional-network lookup failed");
                return Err(FetchError::Status { status: s.as_u16() });
            }
            _ => {}
        }
        let profile: ProfessionalProfile = response
            .json()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))?;
        debug!(%handle, employments = profile.employments.len(), "professional profile fetched");
        Ok(profile)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Code hosting
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the user handle from a code-hosting link or a bare handle.
pub fn code_hosting_username(url: &str) -> Result<String, FetchError> {
    let trimmed = url.trim().trim_matches('/');
    if valid_handle(trimmed) && !trimmed.contains('.') {
        return check_reserved(trimmed);
    }
    let parsed = parse_link(trimmed)?;
    if !host_matches(&parsed, "github.com") {
        return Err(FetchError::InvalidUrl(format!("{url} is not a code-hosting profile")));
    }
    let first = parsed
        .path_segments()
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .ok_or_else(|| FetchError::InvalidUrl(format!("{url} has no user handle")))?;
    if !valid_handle(first) || first.len() > 39 {
        return Err(FetchError::InvalidUrl(format!("{first} is not a valid handle")));
    }
    check_reserved(first)
}

fn check_reserved(handle: &str) -> Result<String, FetchError> {
    if RESERVED_PATHS.contains(&handle.to_lowercase().as_str()) {
        return Err(FetchError::InvalidUrl(format!("{handle} is a reserved path, not a user")));
    }
    Ok(handle.to_string())
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
    name: Option<String>,
    company: Option<String>,
    bio: Option<String>,
    #[serde(default)]
    public_repos: u32,
    #[serde(default)]
    followers: u32,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u32,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    topics: Vec<String>,
    pushed_at: Option<DateTime<Utc>>,
}

pub struct CodeHostingFetcher {
    client: Client,
    api_base: String,
    limiter: Arc<RateLimiter>,
}

impl CodeHostingFetcher {
    pub fn new(api_base: String, limiter: Arc<RateLimiter>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            limiter,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, subject: &str) -> Result<T, FetchError> {
        self.limiter.wait().await;
        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(subject.to_string())),
            s if !s.is_success() => {
                warn!(status = s.as_u16(), %subject, "code-hosting API error");
                Err(FetchError::Status { status: s.as_u16() })
            }
            _ => response.json().await.map_err(|e| FetchError::Payload(e.to_string())),
        }
    }
}

#[async_trait]
impl ProfileFetcher for CodeHostingFetcher {
    type Payload = CodeHostingProfile;

    fn source(&self) -> DataSource {
        DataSource::CodeHosting
    }

    async fn fetch(&self, url: &str) -> Result<CodeHostingProfile, FetchError> {
        let username = code_hosting_username(url)?;
        let user: ApiUser = self
            .get_json(&format!("{}/users/{username}", self.api_base), &username)
            .await?;
        let repos: Vec<ApiRepo> = self
            .get_json(
                &format!("{}/users/{username}/repos?type=owner&sort=pushed&per_page=100", self.api_base),
                &username,
            )
            .await?;
        let profile = summarize(user, &repos, Utc::now());
        debug!(
            username = %profile.username,
            repos = repos.len(),
            skills = profile.skills_detected.len(),
            "code-hosting profile fetched"
        );
        Ok(profile)
    }
}

fn summarize(user: ApiUser, repos: &[ApiRepo], now: DateTime<Utc>) -> CodeHostingProfile {
    let cutoff = now - chrono::Duration::days(RECENT_ACTIVITY_DAYS);
    let mut languages: BTreeMap<String, u32> = BTreeMap::new();
    let mut topics = BTreeSet::new();
    let mut total_stars = 0u32;
    let mut recently_active_repos = 0u32;

    for repo in repos {
        total_stars = total_stars.saturating_add(repo.stargazers_count);
        if repo.fork {
            continue;
        }
        if let Some(lang) = &repo.language {
            *languages.entry(lang.clone()).or_default() += 1;
        }
        topics.extend(repo.topics.iter().map(|t| t.to_lowercase()));
        if repo.pushed_at.is_some_and(|p| p > cutoff) {
            recently_active_repos += 1;
        }
    }

    let mut skills_detected: BTreeSet<String> = topics.iter().cloned().collect();
    for lang in languages.keys() {
        let lower = lang.to_lowercase();
        match LANGUAGE_SKILLS.iter().find(|(l, _)| *l == lower) {
            Some((_, skills)) => skills_detected.extend(skills.iter().map(|s| s.to_string())),
            None => {
                skills_detected.insert(lower);
            }
        }
    }

    CodeHostingProfile {
        username: user.login,
        name: user.name,
        company: user
            .company
            .map(|c| c.trim().trim_start_matches('@').to_string())
            .filter(|c| !c.is_empty()),
        bio: user.bio,
        public_repos: user.public_repos,
        followers: user.followers,
        total_stars,
        languages,
        topics,
        skills_detected,
        recently_active_repos,
        account_created_at: user.created_at,
    }
}
